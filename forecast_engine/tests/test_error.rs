use forecast_engine::error::ForecastError;
use forecast_math::MathError;
use rstest::rstest;

#[test]
fn test_error_display() {
    let error = ForecastError::ConvergenceFailure {
        adapter: "exponential_smoothing".to_string(),
        reason: "no finite error".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Convergence failure in exponential_smoothing: no finite error"
    );

    let error = ForecastError::InsufficientResiduals {
        required: 2,
        actual: 0,
    };
    assert_eq!(
        error.to_string(),
        "Insufficient residuals: need at least 2, have 0"
    );

    let error = ForecastError::UnknownMetric("NetRevenue".to_string());
    assert_eq!(error.to_string(), "Unknown metric: NetRevenue");
}

#[test]
fn test_math_error_conversion() {
    let error: ForecastError = MathError::InsufficientData("too short".to_string()).into();
    assert!(matches!(error, ForecastError::MathError(_)));
    assert!(error.to_string().contains("too short"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: ForecastError = io.into();
    assert!(matches!(error, ForecastError::IoError(_)));
}

#[rstest]
#[case(ForecastError::InsufficientHistory("short".to_string()), true)]
#[case(ForecastError::ConvergenceFailure { adapter: "a".to_string(), reason: "b".to_string() }, true)]
#[case(ForecastError::MathError(MathError::CalculationError("x".to_string())), true)]
#[case(ForecastError::DataError("bad".to_string()), false)]
#[case(ForecastError::InvalidScenarioConfig("inverted".to_string()), false)]
fn test_disqualification_classes(#[case] error: ForecastError, #[case] expected: bool) {
    assert_eq!(error.is_disqualification(), expected);
}
