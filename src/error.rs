use std::path::PathBuf;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into two layers. The low-level variants describe why a single class file
/// could not be parsed or patched, the wrapping variants ([`Error::ClassLoad`],
/// [`Error::Rewrite`], [`Error::Io`]) attach the offending file or class to such a cause so
/// that a failed invocation reports what broke and where.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::Configuration`] - Invalid package names or change-set paths
///
/// ## Class File Errors
/// - [`Error::Malformed`] - Corrupted or invalid class file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the data
/// - [`Error::NotSupported`] - Not a class file, or an unknown constant kind
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::ClassNotFound`] - Class name does not resolve on the class path
/// - [`Error::NameMismatch`] - Declared class name differs from the requested one
/// - [`Error::ConstantPoolOverflow`] - Constant pool cannot hold another entry
///
/// ## Pipeline Errors
/// - [`Error::ClassLoad`] - A selected file could not be loaded
/// - [`Error::Rewrite`] - A loaded class could not be patched
/// - [`Error::Io`] - Filesystem failure on a specific path
/// - [`Error::FileError`] - Filesystem failure without path context
///
/// # Examples
///
/// ```rust,no_run
/// use rembed::{ClassFile, Error};
///
/// match ClassFile::from_file("build/classes/com/app/Main.class") {
///     Ok(class) => println!("Loaded {}", class.this_class_name()?),
///     Err(Error::NotSupported) => eprintln!("Not a class file"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed class: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok::<(), rembed::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// This file type is not supported.
    ///
    /// Raised when the input does not start with the class file magic, or uses a constant
    /// pool tag this library does not know.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Invalid build configuration, detectable before an invocation starts.
    #[error("Invalid configuration - {0}")]
    Configuration(String),

    /// The requested class is not present on the class path.
    #[error("Class '{0}' not found on the class path")]
    ClassNotFound(String),

    /// The class file declares a different name than the one it was loaded as.
    #[error("Class file declares '{declared}' but was loaded as '{expected}'")]
    NameMismatch {
        /// Binary name derived from the file location
        expected: String,
        /// Binary name stored in the class file
        declared: String,
    },

    /// Adding a constant would exceed the 65535 slot limit of the constant pool.
    #[error("Constant pool overflow - cannot add more than {0} entries")]
    ConstantPoolOverflow(usize),

    /// A selected file could not be loaded into a class file model.
    #[error("Failed to load class file '{}'", path.display())]
    ClassLoad {
        /// The file that failed to load
        path: PathBuf,
        /// The underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A loaded class could not be patched with the rename table.
    #[error("Failed to rewrite class '{class}'")]
    Rewrite {
        /// Binary name of the class being rewritten
        class: String,
        /// The underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Filesystem failure on a specific path.
    #[error("I/O failure on '{}'", path.display())]
    Io {
        /// The path being read, written, deleted or walked
        path: PathBuf,
        /// The underlying cause
        #[source]
        source: std::io::Error,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Wraps `self` as the cause of a failed class load of `path`.
    pub(crate) fn into_class_load(self, path: impl Into<PathBuf>) -> Error {
        match self {
            already @ Error::ClassLoad { .. } => already,
            other => Error::ClassLoad {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Wraps `self` as the cause of a failed rewrite of `class`.
    pub(crate) fn into_rewrite(self, class: impl Into<String>) -> Error {
        Error::Rewrite {
            class: class.into(),
            source: Box::new(self),
        }
    }

    /// Attaches `path` to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
