//! Errors for tabular file I/O. Every parse failure carries the file name
//! and line number: input files are hand-maintained datasets, and "somewhere
//! in mortality.txt" is not an actionable diagnostic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("F510  the file cannot be opened ({path}: {source})")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("F511  the file cannot be completely read ({path}: {source})")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("F512  the file cannot be completely written ({source})")]
    Write {
        #[from]
        source: std::io::Error,
    },

    #[error("F514  the file appears to be without data (file {file})")]
    NoData { file: String },

    #[error("F{code}  {message} (line {line} in file {file})")]
    Parse {
        code: u16,
        message: String,
        line: u64,
        file: String,
    },

    #[error("F520  the rescale expression does not begin with 'x' or 'n' ({expr})")]
    RescaleStart { expr: String },

    #[error("F521  the rescale expression would divide by zero ({expr})")]
    RescaleZeroDivide { expr: String },

    #[error("F522  the rescale expression is syntactically incorrect ({expr})")]
    RescaleSyntax { expr: String },

    #[error("F515  a table shape label is incorrect (must be 'a'-'z': {label:?})")]
    BadLabel { label: char },

    #[error("F516  a table dimension is not positive (label {label:?})")]
    BadDimension { label: char },
}

pub type IoResult<T> = Result<T, IoError>;
