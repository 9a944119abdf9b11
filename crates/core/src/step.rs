//! Named negotiation steps, used in diagnostics.

use std::fmt;

use xdp_protocol::{Outcome, Response, Results};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	AccessCamera,
	CreateSession,
	SelectSources,
	Start,
	OpenPipeWireRemote,
}

impl Step {
	pub fn as_str(self) -> &'static str {
		match self {
			Step::AccessCamera => "AccessCamera",
			Step::CreateSession => "CreateSession",
			Step::SelectSources => "SelectSources",
			Step::Start => "Start",
			Step::OpenPipeWireRemote => "OpenPipeWireRemote",
		}
	}
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Unwraps a successful response, turning denial and failure into errors.
pub(crate) fn accept(step: Step, response: Response) -> Result<Results> {
	match response.outcome() {
		Outcome::Success(results) => Ok(results),
		Outcome::Denied(code) => Err(Error::Denied { step, code }),
		Outcome::Error(code) => Err(Error::Failed { step, code }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accept_maps_codes() {
		assert!(accept(Step::Start, Response::new(0, Results::default())).is_ok());
		assert!(matches!(
			accept(Step::Start, Response::new(1, Results::default())),
			Err(Error::Denied { step: Step::Start, code: 1 })
		));
		assert!(matches!(
			accept(Step::SelectSources, Response::new(2, Results::default())),
			Err(Error::Failed {
				step: Step::SelectSources,
				code: 2
			})
		));
	}
}
