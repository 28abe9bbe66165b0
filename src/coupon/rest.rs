//! Lookup against a hosted PostgREST-style backend.

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
  coupon::{CouponLookup, RawAmount},
  entity::{DiscountType, discount_coupon},
  prelude::*,
};

const TABLE_PATH: &str = "rest/v1/discount_coupons";

pub struct RestLookup {
  client: Client,
  base: Url,
  key: String,
}

/// Row as served by the backend. Numeric columns may come back as
/// numbers or strings depending on the column type.
#[derive(Debug, Deserialize)]
struct Row {
  id: Uuid,
  code: String,
  discount_type: DiscountType,
  discount_value: RawAmount,
  max_uses: Option<i32>,
  #[serde(default)]
  current_uses: i32,
  valid_from: DateTime<Utc>,
  valid_until: Option<DateTime<Utc>>,
  is_active: bool,
  course_id: Option<Uuid>,
  minimum_purchase: Option<RawAmount>,
  #[serde(default)]
  description: Option<String>,
  created_at: Option<DateTime<Utc>>,
  updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<Row> for discount_coupon::Model {
  type Error = Error;

  fn try_from(row: Row) -> Result<Self> {
    let created_at = row.created_at.unwrap_or(row.valid_from);

    Ok(Self {
      id: row.id,
      code: row.code,
      discount_type: row.discount_type,
      discount_value: row.discount_value.parse()?,
      max_uses: row.max_uses,
      current_uses: row.current_uses,
      valid_from: row.valid_from,
      valid_until: row.valid_until,
      is_active: row.is_active,
      course_id: row.course_id,
      minimum_purchase: RawAmount::parse_opt(row.minimum_purchase.as_ref())?,
      description: row.description,
      created_at,
      updated_at: row.updated_at.unwrap_or(created_at),
    })
  }
}

fn lookup_failed(err: impl std::fmt::Display) -> Error {
  Error::LookupFailed(err.to_string())
}

impl RestLookup {
  pub fn new(base: &str, key: impl Into<String>) -> Result<Self> {
    // a base without trailing slash would lose its last segment on join
    let base = if base.ends_with('/') {
      Url::parse(base)
    } else {
      Url::parse(&format!("{base}/"))
    }
    .map_err(|err| Error::Invalid(format!("Invalid backend url: {err}")))?;

    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .map_err(|err| Error::Internal(err.to_string()))?;

    Ok(Self { client, base, key: key.into() })
  }

  fn endpoint(&self, code: &str) -> Result<Url> {
    let mut url = self.base.join(TABLE_PATH).map_err(lookup_failed)?;
    url
      .query_pairs_mut()
      .append_pair("select", "*")
      .append_pair("code", &format!("eq.{code}"))
      .append_pair("is_active", "eq.true")
      .append_pair("limit", "1");
    Ok(url)
  }
}

#[async_trait]
impl CouponLookup for RestLookup {
  async fn by_code(&self, code: &str) -> Result<Option<discount_coupon::Model>> {
    let url = self.endpoint(code)?;

    let rows: Vec<Row> = self
      .client
      .get(url)
      .header("apikey", &self.key)
      .bearer_auth(&self.key)
      .send()
      .await
      .and_then(|res| res.error_for_status())
      .map_err(lookup_failed)?
      .json()
      .await
      .map_err(lookup_failed)?;

    // exact match is re-checked, the backend may collate differently
    match rows.into_iter().find(|row| row.code == code) {
      Some(row) => discount_coupon::Model::try_from(row)
        .map(Some)
        .map_err(lookup_failed),
      None => Ok(None),
    }
  }
}
