//! Output-flag handling for caller-supplied argument lists
//!
//! Each tool knows which of its flags name an output location. If the caller
//! already passed one, the caller's path is trusted and nothing is injected;
//! otherwise the tool's computed artifact path is appended.

/// A recognized output flag found in the caller's arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerOutput {
    /// Flag as the tool knows it (e.g. `--output-dir`)
    pub flag: &'static str,

    /// Path given with the flag, if one follows it
    pub value: Option<String>,
}

/// Find the first recognized output flag in `args`
///
/// Matches `flag value` as well as `flag=value`.
pub fn find_output_flag(args: &[String], flags: &[&'static str]) -> Option<CallerOutput> {
    for (i, arg) in args.iter().enumerate() {
        for &flag in flags {
            if arg == flag {
                return Some(CallerOutput {
                    flag,
                    value: args.get(i + 1).cloned(),
                });
            }
            if let Some(value) = arg
                .strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
            {
                return Some(CallerOutput {
                    flag,
                    value: Some(value.to_string()),
                });
            }
        }
    }
    None
}

/// Append `injection` to `args` unless a recognized output flag is present
///
/// Returns the caller's output flag when one was found, `None` when the
/// injection was appended.
pub fn inject_output<I>(args: &mut Vec<String>, flags: &[&'static str], injection: I) -> Option<CallerOutput>
where
    I: IntoIterator<Item = String>,
{
    match find_output_flag(args, flags) {
        Some(found) => Some(found),
        None => {
            args.extend(injection);
            None
        }
    }
}
