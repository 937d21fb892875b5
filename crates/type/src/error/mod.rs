// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod diagnostic;

use std::fmt::{Display, Formatter};

pub use diagnostic::{Diagnostic, ErrorKind, subsystem};

/// Conversion from a component error into the user-visible diagnostic.
pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}

/// Workspace error type. Boxed so `Result<T>` stays pointer sized.
#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Box<Diagnostic>);

impl Error {
	pub fn new(diagnostic: Diagnostic) -> Self {
		Self(Box::new(diagnostic))
	}

	pub fn diagnostic(&self) -> &Diagnostic {
		&self.0
	}

	pub fn into_inner(self) -> Diagnostic {
		*self.0
	}

	pub fn kind(&self) -> ErrorKind {
		self.0.kind
	}

	pub fn code(&self) -> &str {
		&self.0.code
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}] {}", self.0.code, self.0.message)
	}
}

impl std::error::Error for Error {}

impl<T: IntoDiagnostic> From<T> for Error {
	fn from(value: T) -> Self {
		Error::new(value.into_diagnostic())
	}
}

/// Build an [`Error`] from anything that converts into a diagnostic.
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::error::Error::new($crate::error::IntoDiagnostic::into_diagnostic($diagnostic))
	};
}

/// Early-return an [`Error`] from the current function.
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::error!($diagnostic))
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_display_includes_code() {
		let err = error!(Diagnostic::new("QUERY_001", ErrorKind::Validation, "bad identifier"));
		assert_eq!(err.to_string(), "[QUERY_001] bad identifier");
		assert_eq!(err.kind(), ErrorKind::Validation);
	}

	#[test]
	fn test_return_error_short_circuits() {
		fn fails() -> crate::Result<()> {
			return_error!(Diagnostic::new("X_001", ErrorKind::Internal, "boom"));
		}
		assert_eq!(fails().unwrap_err().code(), "X_001");
	}
}
