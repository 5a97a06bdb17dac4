// Forecasts a handful of monthly payment-business metrics and prints the
// competition outcome, the output table and a direct vs composed comparison.
use chrono::NaiveDate;
use fintech_forecaster_workspace::forecast_engine::data::Frequency;
use fintech_forecaster_workspace::forecast_engine::store::Derivation;
use fintech_forecaster_workspace::{EngineConfig, ForecastOrchestrator, SeriesStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = NaiveDate::from_ymd_opt(2021, 1, 1).ok_or("invalid start date")?;
    let dates = (0..36)
        .map(|m| Frequency::Monthly.advance(start, m).ok_or("date overflow"))
        .collect::<Result<Vec<_>, _>>()?;

    let seasonal = [0.0, -3.0, 2.0, 4.0, 1.0, -2.0, -5.0, -4.0, 0.0, 3.0, 5.0, -1.0];
    let fees: Vec<f64> = (0..36)
        .map(|i| 1200.0 + 15.0 * i as f64 + 20.0 * seasonal[i % 12])
        .collect();
    let interest: Vec<f64> = (0..36).map(|i| 400.0 + 4.0 * i as f64).collect();
    let volume: Vec<f64> = (0..36).map(|i| 50_000.0 + 900.0 * i as f64).collect();

    let mut store = SeriesStore::new(dates, Frequency::Monthly)?;
    store.insert_metric("FeeIncome", fees)?;
    store.insert_metric("InterestIncome", interest)?;
    store.insert_metric("TransactionVolume", volume)?;
    store.derive(
        "TotalRevenue",
        Derivation::sum(&["FeeIncome", "InterestIncome"]),
    )?;
    store.derive(
        "TakeRate",
        Derivation::ratio("TotalRevenue", "TransactionVolume"),
    )?;

    let orchestrator = ForecastOrchestrator::new(&store, EngineConfig::default())?;

    let report = orchestrator.forecast_batch(&["FeeIncome", "InterestIncome", "TransactionVolume"], 12);
    for frame in &report.frames {
        if let Some(competition) = frame.competition() {
            println!(
                "{}: winner {} ({} {:.4})",
                frame.metric(),
                competition.winner,
                competition.scoring,
                competition.score
            );
        }
        println!("{}", frame.to_dataframe()?);
    }
    for (metric, error) in &report.failures {
        println!("{} failed: {}", metric, error);
    }

    let comparison = orchestrator.compare_composition("TotalRevenue", 12)?;
    match (&comparison.direct, &comparison.composed) {
        (Ok(direct), Ok(composed)) => {
            println!("TotalRevenue month 12: direct {:.2}, composed {:.2}",
                direct.forecast()[11], composed.forecast()[11]);
        }
        (direct, composed) => {
            println!("direct: {:?}", direct.as_ref().err());
            println!("composed: {:?}", composed.as_ref().err());
        }
    }

    Ok(())
}
