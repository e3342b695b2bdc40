use std::fmt;
use std::path::PathBuf;

/// Errors raised while building the problem specification
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// A required parameter has no registered bound
    MissingBound { parameter: String },
    /// Bound is not a finite interval with `lower < upper`
    InvalidBound {
        parameter: String,
        lower: f64,
        upper: f64,
    },
    /// The required parameter list names the same parameter twice
    DuplicateParameter { parameter: String },
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::MissingBound { parameter } => {
                write!(f, "no bounds registered for parameter '{parameter}'")
            }
            ProblemError::InvalidBound {
                parameter,
                lower,
                upper,
            } => write!(
                f,
                "invalid bounds for parameter '{parameter}': [{lower}, {upper}] (need finite lower < upper)"
            ),
            ProblemError::DuplicateParameter { parameter } => {
                write!(f, "parameter '{parameter}' is listed more than once")
            }
        }
    }
}

impl std::error::Error for ProblemError {}

/// Errors raised while reading the backing store and assembling drivers
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Dataset is absent from the store, or the store itself is unreadable
    DataSource { path: String, reason: String },
    /// No (time, site) cell survived masking
    EmptyMask { stratum: String },
    /// Arrays that must be co-indexed have incompatible shapes
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::DataSource { path, reason } => {
                write!(f, "data source error at '{path}': {reason}")
            }
            DataError::EmptyMask { stratum } => {
                write!(f, "no valid observations remain after masking ({stratum})")
            }
            DataError::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "shape mismatch for {what}: expected {expected:?}, found {found:?}"
            ),
        }
    }
}

impl std::error::Error for DataError {}

/// Failure inside the ET scoring model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Wrong number of parameters passed to the model
    ParameterCount { expected: usize, found: usize },
    /// Driver arrays and observations are not co-indexed
    DriverLength { expected: usize, found: usize },
    /// The model produced a NaN or infinite prediction
    NonFinite { index: usize },
    /// The skill statistic could not be computed
    Skill(String),
    /// Any other model-specific failure
    Other(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ParameterCount { expected, found } => {
                write!(f, "expected {expected} parameters, got {found}")
            }
            ModelError::DriverLength { expected, found } => {
                write!(f, "expected driver length {expected}, got {found}")
            }
            ModelError::NonFinite { index } => {
                write!(f, "non-finite prediction at element {index}")
            }
            ModelError::Skill(msg) => write!(f, "skill score undefined: {msg}"),
            ModelError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Scoring failed on a specific sample row
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationError {
    /// Row of the sample matrix that failed
    pub row: usize,
    /// The offending parameter vector
    pub parameters: Vec<f64>,
    pub source: ModelError,
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluation failed on sample row {} (parameters {:?}): {}",
            self.row, self.parameters, self.source
        )
    }
}

impl std::error::Error for EvaluationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Precondition violations when requesting a sample matrix
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    BaseCountNotPowerOfTwo(usize),
    EmptyProblem,
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::BaseCountNotPowerOfTwo(n) => {
                write!(f, "base sample count must be a power of two, got {n}")
            }
            SamplingError::EmptyProblem => write!(f, "problem has no parameters to sample"),
        }
    }
}

impl std::error::Error for SamplingError {}

/// Errors raised by the variance-decomposition step
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Score vector length does not fit the sampling design
    SampleCountMismatch { rows: usize, step: usize },
    /// All scores are identical, so no variance can be apportioned
    ZeroVariance,
    /// A score is NaN or infinite
    NonFiniteScore { row: usize },
    /// Confidence level outside the open interval (0, 1)
    InvalidConfidence(f64),
    /// The reference normal distribution could not be built
    Distribution(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::SampleCountMismatch { rows, step } => write!(
                f,
                "{rows} scores cannot be split into blocks of {step} rows"
            ),
            AnalysisError::ZeroVariance => write!(f, "score vector has zero variance"),
            AnalysisError::NonFiniteScore { row } => {
                write!(f, "score on sample row {row} is not finite")
            }
            AnalysisError::InvalidConfidence(level) => {
                write!(f, "confidence level must lie in (0, 1), got {level}")
            }
            AnalysisError::Distribution(msg) => write!(f, "normal distribution: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Errors raised while persisting results
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    Write { path: PathBuf, reason: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Write { path, reason } => {
                write!(f, "could not write '{}': {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {}

/// Top-level error for a sensitivity run
#[derive(Debug, Clone, PartialEq)]
pub enum SensitivityError {
    Problem(ProblemError),
    Data(DataError),
    Sampling(SamplingError),
    Evaluation(EvaluationError),
    Analysis(AnalysisError),
    Export(ExportError),
}

impl fmt::Display for SensitivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityError::Problem(e) => write!(f, "problem specification: {e}"),
            SensitivityError::Data(e) => write!(f, "driver assembly: {e}"),
            SensitivityError::Sampling(e) => write!(f, "sampling: {e}"),
            SensitivityError::Evaluation(e) => write!(f, "evaluation: {e}"),
            SensitivityError::Analysis(e) => write!(f, "analysis: {e}"),
            SensitivityError::Export(e) => write!(f, "export: {e}"),
        }
    }
}

impl std::error::Error for SensitivityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SensitivityError::Problem(e) => Some(e),
            SensitivityError::Data(e) => Some(e),
            SensitivityError::Sampling(e) => Some(e),
            SensitivityError::Evaluation(e) => Some(e),
            SensitivityError::Analysis(e) => Some(e),
            SensitivityError::Export(e) => Some(e),
        }
    }
}

impl From<ProblemError> for SensitivityError {
    fn from(err: ProblemError) -> Self {
        SensitivityError::Problem(err)
    }
}

impl From<DataError> for SensitivityError {
    fn from(err: DataError) -> Self {
        SensitivityError::Data(err)
    }
}

impl From<SamplingError> for SensitivityError {
    fn from(err: SamplingError) -> Self {
        SensitivityError::Sampling(err)
    }
}

impl From<EvaluationError> for SensitivityError {
    fn from(err: EvaluationError) -> Self {
        SensitivityError::Evaluation(err)
    }
}

impl From<AnalysisError> for SensitivityError {
    fn from(err: AnalysisError) -> Self {
        SensitivityError::Analysis(err)
    }
}

impl From<ExportError> for SensitivityError {
    fn from(err: ExportError) -> Self {
        SensitivityError::Export(err)
    }
}
