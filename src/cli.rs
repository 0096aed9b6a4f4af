//! Command-line interface definitions and argument parsing

use crate::data::{Encoding, LoadOptions, MalformedPolicy};
use crate::filter::RegionFilter;
use crate::model::{RecencyPolicy, RfmConfig};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Input file encoding
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingArg {
    Latin1,
    Utf8,
}

/// Handling of customers without any valid order date
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyPolicyArg {
    /// Fail with an error
    Reject,
    /// Leave them out of the segmentation
    Exclude,
}

/// Sales dashboard with RFM customer segmentation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the sales CSV file
    #[arg(short, long, default_value = "Superstore-Sales.csv")]
    pub input: PathBuf,

    /// Keep only these regions (repeatable); all regions when omitted
    #[arg(short, long = "region")]
    pub regions: Vec<String>,

    /// Character encoding of the input file
    #[arg(long, value_enum, default_value = "latin1")]
    pub encoding: EncodingArg,

    /// Order date format (chrono strftime syntax)
    #[arg(long, default_value = "%m/%d/%Y")]
    pub date_format: String,

    /// Drop rows missing a customer name or sales amount instead of failing
    #[arg(long)]
    pub skip_malformed: bool,

    /// What to do with customers that have no valid order date
    #[arg(long, value_enum, default_value = "reject")]
    pub recency_policy: RecencyPolicyArg,

    /// Reference date for recency (YYYY-MM-DD); defaults to the day after the latest order
    #[arg(long)]
    pub snapshot: Option<NaiveDate>,

    /// SVG path for the segment scatter plot; trend and category charts are written alongside
    /// as `<stem>_trend.svg` and `<stem>_category.svg`
    #[arg(short, long, default_value = "segments.svg", value_parser = parse_svg_path)]
    pub output: PathBuf,

    /// Also write the segmentation as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Classification mode: report the tier this total spend would receive
    /// Example: --classify-spend 250.00
    #[arg(short, long)]
    pub classify_spend: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Accept only paths ending in `.svg`, the one format the charts are rendered in
fn parse_svg_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(path),
        Some(ext) => Err(format!("charts are written as SVG, not '.{}'", ext)),
        None => Err("output path needs a '.svg' extension".to_string()),
    }
}

impl Args {
    /// Parse the spend value given to `--classify-spend`
    pub fn parse_classify_spend(&self) -> crate::Result<Option<Decimal>> {
        match self.classify_spend.as_deref() {
            Some(raw) => {
                let spend: Decimal = raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid spend value: {}", raw))?;
                Ok(Some(spend))
            }
            None => Ok(None),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            encoding: match self.encoding {
                EncodingArg::Latin1 => Encoding::Latin1,
                EncodingArg::Utf8 => Encoding::Utf8,
            },
            date_format: self.date_format.clone(),
            malformed: if self.skip_malformed {
                MalformedPolicy::Skip
            } else {
                MalformedPolicy::Reject
            },
            ..LoadOptions::default()
        }
    }

    pub fn rfm_config(&self) -> RfmConfig {
        RfmConfig {
            recency_policy: match self.recency_policy {
                RecencyPolicyArg::Reject => RecencyPolicy::Reject,
                RecencyPolicyArg::Exclude => RecencyPolicy::Exclude,
            },
            snapshot: self.snapshot,
        }
    }

    pub fn region_filter(&self) -> RegionFilter {
        RegionFilter::from_selection(self.regions.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tierforge"]).unwrap();
        assert_eq!(args.input, PathBuf::from("Superstore-Sales.csv"));
        assert_eq!(args.load_options(), LoadOptions::default());
        assert_eq!(args.rfm_config(), RfmConfig::default());
        assert_eq!(args.region_filter(), RegionFilter::All);
        assert_eq!(args.parse_classify_spend().unwrap(), None);
    }

    #[test]
    fn test_full_flags() {
        let args = Args::try_parse_from([
            "tierforge",
            "--input",
            "sales.csv",
            "--region",
            "East",
            "-r",
            "West",
            "--encoding",
            "utf8",
            "--skip-malformed",
            "--recency-policy",
            "exclude",
            "--snapshot",
            "2024-01-11",
            "--json",
            "out.json",
        ])
        .unwrap();

        assert_eq!(args.region_filter(), RegionFilter::from_selection(["East", "West"]));
        let options = args.load_options();
        assert_eq!(options.encoding, Encoding::Utf8);
        assert_eq!(options.malformed, MalformedPolicy::Skip);

        let config = args.rfm_config();
        assert_eq!(config.recency_policy, RecencyPolicy::Exclude);
        assert_eq!(config.snapshot, NaiveDate::from_ymd_opt(2024, 1, 11));
        assert_eq!(args.json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_parse_classify_spend() {
        let mut args = Args::try_parse_from(["tierforge", "--classify-spend", "250.50"]).unwrap();
        assert_eq!(args.parse_classify_spend().unwrap(), Some(dec!(250.50)));

        args.classify_spend = Some("lots".to_string());
        assert!(args.parse_classify_spend().is_err());
    }

    #[test]
    fn test_output_must_be_svg() {
        let args = Args::try_parse_from(["tierforge", "--output", "out/Dashboard.SVG"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out/Dashboard.SVG"));

        assert!(Args::try_parse_from(["tierforge", "--output", "segments.png"]).is_err());
        assert!(Args::try_parse_from(["tierforge", "-o", "segments"]).is_err());
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        assert!(Args::try_parse_from(["tierforge", "--snapshot", "11/01/2024"]).is_err());
    }
}
