use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}
impl Display for PathSegment {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Key(key) => f.write_str(key),
			Self::Index(index) => write!(f, "{index}"),
		}
	}
}

/// Renders a value path as `a.b`, `a[2]` and `a["weird key"]`, or `(root)` when empty.
///
/// The leading segment is always printed bare.
pub fn display_path(path: &[PathSegment]) -> String {
	let Some((first, rest)) = path.split_first() else {
		return "(root)".to_string();
	};
	let mut display = first.to_string();

	for segment in rest {
		match segment {
			PathSegment::Index(index) => display.push_str(&format!("[{index}]")),
			PathSegment::Key(key) if is_field_name(key) => {
				display.push('.');
				display.push_str(key);
			},
			PathSegment::Key(key) => display.push_str(&format!("[\"{key}\"]")),
		}
	}

	display
}

fn is_field_name(name: &str) -> bool {
	let mut chars = name.chars();
	let Some(first) = chars.next() else { return false };

	(first.is_ascii_alphabetic() || first == '_' || first == '$')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
