use chrono::NaiveDate;
use forecast_engine::data::{Frequency, GapFill, TimeSeries};
use forecast_engine::error::ForecastError;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|k| Frequency::Monthly.advance(start, k).unwrap())
        .collect()
}

#[test]
fn test_time_series_creation() {
    let dates = monthly_dates(date(2023, 1, 1), 4);
    let series = TimeSeries::new("FeeIncome", dates, vec![1.0, 2.0, 3.0, 4.0], Frequency::Monthly)
        .unwrap();

    assert_eq!(series.name(), "FeeIncome");
    assert_eq!(series.len(), 4);
    assert!(!series.is_empty());
    assert_eq!(series.first_timestamp(), date(2023, 1, 1));
    assert_eq!(series.last_timestamp(), date(2023, 4, 1));
}

#[test]
fn test_month_end_dates_clamp_from_anchor() {
    let dates = vec![date(2021, 1, 31), date(2021, 2, 28), date(2021, 3, 31)];
    let series = TimeSeries::new("m", dates, vec![1.0, 2.0, 3.0], Frequency::Monthly).unwrap();

    assert_eq!(
        series.future_timestamps(2).unwrap(),
        vec![date(2021, 4, 30), date(2021, 5, 31)]
    );
}

#[test]
fn test_gap_in_timestamps_rejected() {
    let dates = vec![date(2023, 1, 1), date(2023, 2, 1), date(2023, 4, 1)];
    let result = TimeSeries::new("m", dates, vec![1.0, 2.0, 3.0], Frequency::Monthly);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_invalid_series_rejected() {
    let dates = monthly_dates(date(2023, 1, 1), 3);

    let mismatched = TimeSeries::new("m", dates.clone(), vec![1.0, 2.0], Frequency::Monthly);
    assert!(matches!(mismatched, Err(ForecastError::DataError(_))));

    let non_finite = TimeSeries::new("m", dates, vec![1.0, f64::NAN, 3.0], Frequency::Monthly);
    assert!(matches!(non_finite, Err(ForecastError::DataError(_))));

    let empty = TimeSeries::new("m", vec![], vec![], Frequency::Monthly);
    assert!(matches!(empty, Err(ForecastError::DataError(_))));
}

#[rstest]
#[case(date(2023, 1, 1), date(2023, 1, 2), Frequency::Daily)]
#[case(date(2023, 1, 2), date(2023, 1, 9), Frequency::Weekly)]
#[case(date(2023, 1, 1), date(2023, 2, 1), Frequency::Monthly)]
#[case(date(2023, 1, 1), date(2023, 4, 1), Frequency::Quarterly)]
#[case(date(2023, 1, 1), date(2024, 1, 1), Frequency::Yearly)]
fn test_frequency_inference(
    #[case] first: NaiveDate,
    #[case] second: NaiveDate,
    #[case] expected: Frequency,
) {
    assert_eq!(Frequency::infer(&[first, second]).unwrap(), expected);
}

#[test]
fn test_frequency_inference_rejects_irregular_spacing() {
    let result = Frequency::infer(&[date(2023, 1, 1), date(2023, 1, 4)]);
    assert!(result.is_err());
}

#[rstest]
#[case(Frequency::Daily, 7)]
#[case(Frequency::Weekly, 52)]
#[case(Frequency::Monthly, 12)]
#[case(Frequency::Quarterly, 4)]
#[case(Frequency::Yearly, 1)]
fn test_season_length(#[case] frequency: Frequency, #[case] expected: usize) {
    assert_eq!(frequency.season_length(), expected);
}

#[test]
fn test_season_index() {
    assert_eq!(Frequency::Monthly.season_index(date(2023, 3, 15)), 2);
    assert_eq!(Frequency::Quarterly.season_index(date(2023, 11, 1)), 3);
    // 2023-01-02 was a Monday
    assert_eq!(Frequency::Daily.season_index(date(2023, 1, 2)), 0);
    assert_eq!(Frequency::Yearly.season_index(date(2023, 6, 1)), 0);
}

#[rstest]
#[case(date(2021, 1, 4), 0)] // ISO 2021-W01
#[case(date(2020, 12, 24), 51)] // ISO 2020-W52
#[case(date(2020, 12, 31), 51)] // ISO 2020-W53
#[case(date(2021, 1, 1), 51)] // still 2020-W53
fn test_weekly_season_index_folds_week_53(#[case] day: NaiveDate, #[case] expected: usize) {
    assert_eq!(Frequency::Weekly.season_index(day), expected);
    assert!(Frequency::Weekly.season_index(day) < Frequency::Weekly.season_length());
}

#[test]
fn test_regularize_fills_gaps() {
    let observations = vec![(date(2023, 4, 1), 40.0), (date(2023, 1, 1), 10.0)];

    let linear =
        TimeSeries::regularize("m", observations.clone(), Frequency::Monthly, GapFill::Linear)
            .unwrap();
    assert_eq!(linear.values(), &[10.0, 20.0, 30.0, 40.0]);
    assert_eq!(linear.timestamps(), monthly_dates(date(2023, 1, 1), 4).as_slice());

    let filled = TimeSeries::regularize(
        "m",
        observations.clone(),
        Frequency::Monthly,
        GapFill::ForwardFill,
    )
    .unwrap();
    assert_eq!(filled.values(), &[10.0, 10.0, 10.0, 40.0]);

    let rejected = TimeSeries::regularize("m", observations, Frequency::Monthly, GapFill::Reject);
    assert!(matches!(rejected, Err(ForecastError::DataError(_))));
}

#[test]
fn test_regularize_rejects_off_grid_and_duplicate_dates() {
    let off_grid = vec![(date(2023, 1, 1), 1.0), (date(2023, 2, 15), 2.0)];
    assert!(TimeSeries::regularize("m", off_grid, Frequency::Monthly, GapFill::Linear).is_err());

    let duplicate = vec![(date(2023, 1, 1), 1.0), (date(2023, 1, 1), 2.0)];
    assert!(TimeSeries::regularize("m", duplicate, Frequency::Monthly, GapFill::Linear).is_err());
}

#[test]
fn test_split_at() {
    let series = TimeSeries::new(
        "m",
        monthly_dates(date(2023, 1, 1), 5),
        vec![1.0, 2.0, 3.0, 4.0, 5.0],
        Frequency::Monthly,
    )
    .unwrap();

    let (train, test) = series.split_at(3).unwrap();
    assert_eq!(train.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(test.values(), &[4.0, 5.0]);
    assert_eq!(test.first_timestamp(), date(2023, 4, 1));

    assert!(series.split_at(0).is_err());
    assert!(series.split_at(5).is_err());
}

#[test]
fn test_infer_constructor() {
    let series = TimeSeries::infer(
        "q",
        vec![date(2022, 1, 1), date(2022, 4, 1), date(2022, 7, 1)],
        vec![1.0, 2.0, 3.0],
    )
    .unwrap();
    assert_eq!(series.frequency(), Frequency::Quarterly);
    assert_eq!(series.future_timestamps(1).unwrap(), vec![date(2022, 10, 1)]);
}
