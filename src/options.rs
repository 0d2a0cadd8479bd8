//! Page layout options for PDF export

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Smallest scale factor Chrome accepts for printing
pub const MIN_SCALE: f64 = 0.1;
/// Largest scale factor Chrome accepts for printing
pub const MAX_SCALE: f64 = 2.0;

/// Named paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PaperFormat {
    #[default]
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Portrait `(width, height)` in inches
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }
}

/// Units accepted in margin lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    In,
    Cm,
    Mm,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
        }
    }

    fn per_inch(self) -> f64 {
        match self {
            LengthUnit::Px => 96.0,
            LengthUnit::In => 1.0,
            LengthUnit::Cm => 2.54,
            LengthUnit::Mm => 25.4,
        }
    }
}

/// A CSS-like length such as `0.25in` or `12mm`
///
/// A bare number is read as CSS pixels (96 per inch).
///
/// ```
/// let margin: mdpdf::Length = "0.5in".parse().unwrap();
/// assert_eq!(margin.to_inches(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn inches(value: f64) -> Self {
        Self { value, unit: LengthUnit::In }
    }

    pub fn to_inches(self) -> f64 {
        self.value / self.unit.per_inch()
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let units = [LengthUnit::In, LengthUnit::Cm, LengthUnit::Mm, LengthUnit::Px];
        let (number, unit) = units
            .iter()
            .find_map(|u| s.strip_suffix(u.suffix()).map(|n| (n, *u)))
            .unwrap_or((s, LengthUnit::Px));

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| Error::ConfigError(format!("Invalid length '{}'", s)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(Error::ConfigError(format!("Length must be a non-negative number: '{}'", s)));
        }
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Page margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: Length::inches(0.25),
            right: Length::inches(0.5),
            bottom: Length::inches(0.25),
            left: Length::inches(0.5),
        }
    }
}

/// Options for the print-to-PDF step
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Where the PDF is written
    pub path: PathBuf,
    pub format: PaperFormat,
    /// Rendering scale, between [`MIN_SCALE`] and [`MAX_SCALE`]
    pub scale: f64,
    /// Print background graphics
    pub print_background: bool,
    pub landscape: bool,
    pub margins: Margins,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.pdf"),
            format: PaperFormat::Letter,
            scale: 0.8,
            print_background: true,
            landscape: false,
            margins: Margins::default(),
        }
    }
}

impl PdfOptions {
    /// Check values the browser would otherwise reject mid-run
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(Error::ConfigError(format!(
                "Scale must be between {} and {}, got {}",
                MIN_SCALE, MAX_SCALE, self.scale
            )));
        }
        if self.path.as_os_str().is_empty() {
            return Err(Error::ConfigError("Output path is empty".into()));
        }
        Ok(())
    }

    /// Paper `(width, height)` in inches, honouring orientation
    pub fn paper_size(&self) -> (f64, f64) {
        let (w, h) = self.format.size_inches();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lengths_with_units() {
        assert_eq!("0.25in".parse::<Length>().unwrap().to_inches(), 0.25);
        assert_eq!("25.4mm".parse::<Length>().unwrap().to_inches(), 1.0);
        assert_eq!("2.54cm".parse::<Length>().unwrap().to_inches(), 1.0);
        assert_eq!("96px".parse::<Length>().unwrap().to_inches(), 1.0);
        assert_eq!("48".parse::<Length>().unwrap().to_inches(), 0.5);
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!("wide".parse::<Length>().is_err());
        assert!("-1in".parse::<Length>().is_err());
        assert!("in".parse::<Length>().is_err());
    }

    #[test]
    fn length_display_keeps_unit() {
        assert_eq!(Length::inches(0.5).to_string(), "0.5in");
    }

    #[test]
    fn default_options_match_letter_layout() {
        let opts = PdfOptions::default();
        assert_eq!(opts.format, PaperFormat::Letter);
        assert_eq!(opts.scale, 0.8);
        assert!(opts.print_background);
        assert_eq!(opts.margins.top.to_inches(), 0.25);
        assert_eq!(opts.margins.left.to_inches(), 0.5);
        assert_eq!(opts.paper_size(), (8.5, 11.0));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn scale_out_of_range_is_config_error() {
        for scale in [0.05, 2.5] {
            let opts = PdfOptions { scale, ..Default::default() };
            assert!(matches!(opts.validate(), Err(Error::ConfigError(_))));
        }
    }

    #[test]
    fn landscape_swaps_paper_dimensions() {
        let opts = PdfOptions { format: PaperFormat::A4, landscape: true, ..Default::default() };
        assert_eq!(opts.paper_size(), (11.7, 8.27));
    }
}
