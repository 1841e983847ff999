use serde_json::Value;

use crate::issue::Issue;

/// Every problem found in one input, in document order.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{}", render(.issues))]
pub struct ValidationError {
	issues: Vec<Issue>,
}
impl ValidationError {
	pub fn new(issues: Vec<Issue>) -> Self {
		Self { issues }
	}

	pub fn issues(&self) -> &[Issue] {
		&self.issues
	}

	pub fn messages(&self) -> Vec<String> {
		self.issues.iter().map(ToString::to_string).collect()
	}

	pub fn to_value(&self) -> Value {
		Value::Array(self.issues.iter().map(Issue::to_value).collect())
	}
}

fn render(issues: &[Issue]) -> String {
	issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}
