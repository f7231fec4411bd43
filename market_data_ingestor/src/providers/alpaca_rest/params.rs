use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

fn query_value<T: Serialize>(value: &T) -> String {
    // unit enums serialize to a bare JSON string
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// Alpaca's timeframe token, e.g. `1Day`, `15Min`.
pub fn alpaca_timeframe(tf: &TimeFrame) -> String {
    let unit = match tf.unit {
        TimeFrameUnit::Minute => "Min",
        TimeFrameUnit::Hour => "Hour",
        TimeFrameUnit::Day => "Day",
        TimeFrameUnit::Week => "Week",
        TimeFrameUnit::Month => "Month",
    };
    format!("{}{}", tf.amount, unit)
}

/// Rejects timeframes the bars endpoint does not accept.
pub fn validate_timeframe(tf: &TimeFrame) -> Result<(), ProviderError> {
    let ok = match tf.unit {
        TimeFrameUnit::Minute => (1..=59).contains(&tf.amount),
        TimeFrameUnit::Hour => (1..=23).contains(&tf.amount),
        TimeFrameUnit::Day | TimeFrameUnit::Week => tf.amount == 1,
        TimeFrameUnit::Month => [1, 2, 3, 6, 12].contains(&tf.amount),
    };
    if ok {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!("timeframe {tf} is not supported by Alpaca"),
        }
        .fail()
    }
}

/// Builds the query string pairs for one page of a bars request.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let mut query = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), alpaca_timeframe(&params.timeframe)),
        ("start".to_string(), params.start.to_rfc3339()),
        ("end".to_string(), params.end.to_rfc3339()),
    ];

    let defaults = AlpacaBarsParams::default();
    let extra = match &params.provider_specific {
        ProviderParams::Alpaca(p) => p,
        ProviderParams::None => &defaults,
    };
    if let Some(adjustment) = &extra.adjustment {
        query.push(("adjustment".to_string(), query_value(adjustment)));
    }
    if let Some(feed) = &extra.feed {
        query.push(("feed".to_string(), query_value(feed)));
    }
    if let Some(currency) = &extra.currency {
        query.push(("currency".to_string(), currency.clone()));
    }
    if let Some(limit) = extra.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    // ascending unless asked otherwise, so pages concatenate in date order
    let sort = extra.sort.unwrap_or_default();
    query.push(("sort".to_string(), query_value(&sort)));
    query
}
