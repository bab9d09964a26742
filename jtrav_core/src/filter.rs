//! Removes the tool's own verbosity flag before the front end sees the arguments

use crate::config::ConfigError;
use crate::session::Session;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSyntax {
    /// `--verbose=<n>`
    Equals,
    /// `--verbose <n>`
    Separate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub prefix: String,
    pub syntax: FlagSyntax,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            prefix: "--verbose".to_string(),
            syntax: FlagSyntax::Equals,
        }
    }
}

impl FilterConfig {
    pub fn separate(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            syntax: FlagSyntax::Separate,
        }
    }
}

/// Strip every verbosity flag, setting the session level from its payload
///
/// The remaining arguments keep their order. The last flag wins.
pub fn filter_command_line(
    args: &[String],
    session: &mut Session,
    config: &FilterConfig,
) -> Result<Vec<String>, ConfigError> {
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let payload = match config.syntax {
            FlagSyntax::Equals => {
                if arg == &config.prefix {
                    Some(String::new())
                } else {
                    arg.strip_prefix(config.prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('='))
                        .map(str::to_string)
                }
            }
            FlagSyntax::Separate => {
                if arg == &config.prefix {
                    Some(
                        iter.next()
                            .cloned()
                            .ok_or_else(|| ConfigError::missing_value(arg))?,
                    )
                } else {
                    None
                }
            }
        };

        let Some(payload) = payload else {
            remaining.push(arg.clone());
            continue;
        };

        let level = payload
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidVerbosity {
                flag: arg.clone(),
                value: payload.clone(),
            })?;
        session.set_verbosity(level);

        if session.is_tracing() {
            crate::log_debug!("Verbosity flag removed", "flag" => arg, "level" => level);
        }
    }

    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equals_flag_is_removed() {
        let mut session = Session::new();
        let out = filter_command_line(
            &args(&["-source", "1.7", "--verbose=3", "A.java"]),
            &mut session,
            &FilterConfig::default(),
        )
        .unwrap();

        assert_eq!(out, args(&["-source", "1.7", "A.java"]));
        assert_eq!(session.verbosity(), 3);
    }

    #[test]
    fn test_last_flag_wins() {
        let mut session = Session::new();
        let out = filter_command_line(
            &args(&["--verbose=1", "A.java", "--verbose=4"]),
            &mut session,
            &FilterConfig::default(),
        )
        .unwrap();
        assert_eq!(out, args(&["A.java"]));
        assert_eq!(session.verbosity(), 4);
    }

    #[test]
    fn test_similar_options_pass_through() {
        let mut session = Session::new();
        let out = filter_command_line(
            &args(&["--verbose-level", "--verbosely=2", "A.java"]),
            &mut session,
            &FilterConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(session.verbosity(), 0);
    }

    #[test]
    fn test_invalid_payloads() {
        let mut session = Session::new();
        for bad in ["--verbose=abc", "--verbose=-1", "--verbose"] {
            assert_matches!(
                filter_command_line(&args(&[bad, "A.java"]), &mut session, &FilterConfig::default()),
                Err(ConfigError::InvalidVerbosity { .. })
            );
        }
    }

    #[test]
    fn test_separate_syntax() {
        let config = FilterConfig::separate("-rose:verbose");
        let mut session = Session::new();
        let out = filter_command_line(
            &args(&["-rose:verbose", "2", "A.java"]),
            &mut session,
            &config,
        )
        .unwrap();
        assert_eq!(out, args(&["A.java"]));
        assert_eq!(session.verbosity(), 2);

        assert_matches!(
            filter_command_line(&args(&["A.java", "-rose:verbose"]), &mut session, &config),
            Err(ConfigError::MissingValue { .. })
        );
    }
}
