use crate::types::Px2VwOptions;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn px_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(\d*\.?\d+)px").unwrap())
}

/// Rewrite every `<number>px` in rendered CSS as viewport-width units:
/// `vw = px / (viewportWidth / 100)`.
///
/// This is a plain text substitution on the output; values inside strings
/// or comments are rewritten too.
pub fn rewrite(css: &str, options: &Px2VwOptions) -> String {
    let unit = options.viewport_width / 100.0;

    px_regex()
        .replace_all(css, |caps: &Captures| match caps[1].parse::<f64>() {
            Ok(px) => format!("{}vw", px / unit),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(viewport_width: f64) -> Px2VwOptions {
        Px2VwOptions { viewport_width }
    }

    #[test]
    fn test_rewrites_integers() {
        assert_eq!(rewrite(".a { width: 375px; }", &options(750.0)), ".a { width: 50vw; }");
    }

    #[test]
    fn test_rewrites_decimals_and_multiple_values() {
        assert_eq!(
            rewrite(".a { margin: 7.5px 15px .75px; }", &options(750.0)),
            ".a { margin: 1vw 2vw 0.1vw; }"
        );
    }

    #[test]
    fn test_keeps_other_units() {
        let css = ".a { width: 10em; height: 50%; }";
        assert_eq!(rewrite(css, &options(750.0)), css);
    }

    #[test]
    fn test_negative_values_keep_sign() {
        assert_eq!(rewrite(".a { top: -75px; }", &options(750.0)), ".a { top: -10vw; }");
    }
}
