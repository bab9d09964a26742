//! Logging macros taking a `Code` and `"key" => value` context pairs
//!
//! Context values may be any `Display` type.

/// Render `"key" => value` pairs and hand them to `$sink` as `Vec<(&str, &str)>`
#[doc(hidden)]
#[macro_export]
macro_rules! __with_log_context {
    ($sink:expr $(, $key:expr => $value:expr)*) => {{
        let rendered: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),*];
        let pairs: Vec<(&str, &str)> = rendered.iter().map(|(k, v)| (*k, v.as_str())).collect();
        ($sink)(pairs)
    }};
}

/// Log an error with a code and optional span
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__with_log_context!(
            |pairs| $crate::logging::log_error_with_context($code, $message, Some($span), pairs)
            $(, $key => $value)*
        )
    };

    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__with_log_context!(
            |pairs| $crate::logging::log_error_with_context($code, $message, None, pairs)
            $(, $key => $value)*
        )
    };
}

/// Log a success code
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__with_log_context!(
            |pairs| $crate::logging::log_success_with_context($code, $message, pairs)
            $(, $key => $value)*
        )
    };
}

/// Log an informational message
#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__with_log_context!(
            |pairs| $crate::logging::log_info_with_context($message, pairs)
            $(, $key => $value)*
        )
    };
}

/// Log a warning
#[macro_export]
macro_rules! log_warning {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__with_log_context!(
            |pairs| $crate::logging::log_event_with_context(
                $crate::logging::LogEvent::warning($message),
                pairs,
            )
            $(, $key => $value)*
        )
    };
}

/// Log a debug message; arguments are not evaluated unless debug is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::debug_enabled() {
            $crate::__with_log_context!(
                |pairs| $crate::logging::log_event_with_context(
                    $crate::logging::LogEvent::debug($message),
                    pairs,
                )
                $(, $key => $value)*
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;
    use crate::utils::{Position, Span};

    #[test]
    fn test_macros_accept_display_values() {
        let count = 3usize;
        let path = std::path::Path::new("A.java");
        let span = Span::new(Position::new(0, 1, 1), Position::new(4, 1, 5));

        crate::log_error!(codes::front_end::SYNTAX_ERROR, "bad");
        crate::log_error!(codes::front_end::SYNTAX_ERROR, "bad", "count" => count);
        crate::log_error!(codes::front_end::SYNTAX_ERROR, "bad", span = span, "path" => path.display());
        crate::log_success!(codes::success::BATCH_COMPILED, "ok", "units" => count,);
        crate::log_info!("info", "path" => path.display());
        crate::log_warning!("warn");
        crate::log_debug!("debug", "count" => count);
    }
}
