//! Notification - queue message body の decode
//!
//! Object store の event notification 形式:
//!
//! ```json
//! {"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"a%2Fb.json"}}}]}
//! ```
//!
//! # Decode の単位
//! - body が JSON object でない（配列・文字列など） / `Records` が配列でない → envelope の decode 失敗
//! - body が `null`、`Records` が無い or null → 空の envelope（no-op）
//! - record は 1 件ずつ decode する。`bucket.name` / `object.key` の型が合わない record は
//!   その record だけ失敗し、兄弟 record の処理は続く
//! - null は既定値として読む。使わない metadata は型が合わなくても既定値で読み飛ばす
//! - 知らないフィールドは無視する

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::errors::UnescapeError;
use super::locator::{Locator, unescape_key};

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "Records", default)]
    records: Option<Vec<Value>>,
}

/// null を既定値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 型が合わなければ既定値にする（metadata 用）
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode 済みの message body。record 本体は遅延 decode する。
#[derive(Debug, Default)]
pub struct NotificationEnvelope {
    records: Vec<Value>,
}

impl NotificationEnvelope {
    /// Message body を decode する
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEnvelope = match serde_json::from_str::<Value>(body)? {
            Value::Null => RawEnvelope::default(),
            object @ Value::Object(_) => serde_json::from_value(object)?,
            other => {
                return Err(serde_json::Error::custom(format!(
                    "expected a notification object, got {}",
                    json_kind(&other)
                )));
            }
        };
        Ok(Self {
            records: raw.records.unwrap_or_default(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 配列順に (index, record) を返す
    pub fn into_records(
        self,
    ) -> impl Iterator<Item = (usize, Result<NotificationRecord, serde_json::Error>)> {
        self.records
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index, serde_json::from_value(value)))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 1 件の object 作成通知
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationRecord {
    #[serde(deserialize_with = "lenient")]
    pub event_version: String,
    #[serde(deserialize_with = "lenient")]
    pub event_source: String,
    #[serde(deserialize_with = "lenient")]
    pub aws_region: String,
    #[serde(deserialize_with = "lenient")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub event_name: String,
    #[serde(deserialize_with = "lenient")]
    pub user_identity: UserIdentity,
    #[serde(deserialize_with = "lenient")]
    pub request_parameters: RequestParameters,
    #[serde(deserialize_with = "lenient")]
    pub response_elements: ResponseElements,
    #[serde(deserialize_with = "null_as_default")]
    pub s3: ObjectStoreEntity,
}

impl NotificationRecord {
    pub fn bucket_name(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Percent-encoded のままの key
    pub fn raw_key(&self) -> &str {
        &self.s3.object.key
    }

    /// Key を unescape して Locator を作る
    pub fn locator(&self, scheme: &str) -> Result<Locator, UnescapeError> {
        let key = unescape_key(self.raw_key())?;
        Ok(Locator::new(scheme, self.bucket_name(), key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserIdentity {
    #[serde(deserialize_with = "lenient")]
    pub principal_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParameters {
    #[serde(rename = "sourceIPAddress", deserialize_with = "lenient")]
    pub source_ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseElements {
    #[serde(rename = "x-amz-request-id", deserialize_with = "lenient")]
    pub request_id: String,
    #[serde(rename = "x-amz-id-2", deserialize_with = "lenient")]
    pub id_2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectStoreEntity {
    #[serde(deserialize_with = "lenient")]
    pub s3_schema_version: String,
    #[serde(deserialize_with = "lenient")]
    pub configuration_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bucket: BucketEntity,
    #[serde(deserialize_with = "null_as_default")]
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketEntity {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub owner_identity: UserIdentity,
    #[serde(deserialize_with = "lenient")]
    pub arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectEntity {
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "lenient")]
    pub size: i64,
    #[serde(deserialize_with = "lenient")]
    pub e_tag: String,
    #[serde(deserialize_with = "lenient")]
    pub sequencer: String,
}
