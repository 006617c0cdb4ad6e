use log::warn;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BuildLensError, Result};
use crate::report::{BuildStatus, TestSummary};

use super::types::BuildRecord;

const PARAMETERS_ACTION: &str = "hudson.model.ParametersAction";
const TEST_RESULT_ACTION: &str = "hudson.tasks.junit.TestResultAction";

/// Convert one job's raw build-listing payload into build records.
///
/// Accepts either the XML form (`api/xml?...&wrapper=root`) or the JSON form
/// (`api/json?tree=...`); the format is sniffed from the payload itself.
/// A build missing required fields is skipped with a warning; it never takes
/// the rest of the job's builds down with it.
pub fn normalize(raw: &str, job: &str) -> Result<Vec<BuildRecord>> {
    let raw_builds = if raw.trim_start().starts_with('<') {
        parse_xml(raw)?
    } else {
        parse_json(raw)?
    };

    let records = raw_builds
        .into_iter()
        .filter_map(|raw_build| match convert_build(job, raw_build) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed build in job {job}: {e}");
                None
            }
        })
        .collect();

    Ok(records)
}

fn parse_xml(raw: &str) -> Result<Vec<RawBuild>> {
    let listing: RawListing = quick_xml::de::from_str(raw)?;
    Ok(listing.builds)
}

fn parse_json(raw: &str) -> Result<Vec<RawBuild>> {
    let value: Value = serde_json::from_str(raw)?;

    // xml-js style responses nest the listing under "root"
    let listing = value.get("root").unwrap_or(&value);
    let builds = listing
        .get("build")
        .or_else(|| listing.get("builds"))
        .cloned()
        .unwrap_or(Value::Null);

    coerce_build_list(builds)
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(Into::into))
        .collect()
}

/// Jenkins returns a lone build as a bare object rather than a one-element
/// array. Always hand the caller a list, so nothing downstream has to guess.
fn coerce_build_list(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        single => vec![single],
    }
}

fn convert_build(job: &str, raw: RawBuild) -> Result<BuildRecord> {
    let number = raw
        .number
        .ok_or_else(|| BuildLensError::MalformedBuild(format!("build in job {job} has no number")))?;
    let timestamp = raw.timestamp.ok_or_else(|| {
        BuildLensError::MalformedBuild(format!("build {job}/{number} has no timestamp"))
    })?;

    let building = raw.building.unwrap_or(false);
    let status = derive_status(building, raw.result.as_deref());

    // Jenkins reports duration 0 for in-progress builds; treat it as absent
    let duration_ms = if building {
        None
    } else {
        raw.duration.filter(|d| *d >= 0)
    };

    let parameters = raw
        .actions
        .iter()
        .find(|action| action.class.as_deref() == Some(PARAMETERS_ACTION))
        .map(|action| {
            action
                .parameters
                .iter()
                .filter_map(|p| Some((p.name.clone()?, p.value.clone()?)))
                .collect()
        })
        // Builds that fail before parameter resolution carry no
        // ParametersAction at all
        .unwrap_or_default();

    let test_action = raw
        .actions
        .iter()
        .find(|action| action.class.as_deref() == Some(TEST_RESULT_ACTION));
    let test_summary = test_action.and_then(|action| {
        match (action.fail_count, action.skip_count, action.total_count) {
            (Some(fail), Some(skip), Some(total)) => Some(TestSummary::new(fail, skip, total)),
            _ => None,
        }
    });
    let test_report_path = test_action.and_then(|action| action.url_name.clone());

    Ok(BuildRecord {
        job: job.to_string(),
        number,
        timestamp,
        duration_ms,
        status,
        parameters,
        test_summary,
        test_report_path,
    })
}

/// The `building` flag always wins over whatever `result` says.
fn derive_status(building: bool, result: Option<&str>) -> BuildStatus {
    if building {
        return BuildStatus::Running;
    }
    match result.map(str::to_ascii_uppercase).as_deref() {
        Some("SUCCESS") => BuildStatus::Success,
        Some("FAILURE") => BuildStatus::Failure,
        Some("ABORTED") => BuildStatus::Aborted,
        Some("UNSTABLE") => BuildStatus::Unstable,
        _ => BuildStatus::Unknown,
    }
}

/// Build listing as returned by the Jenkins XML API with `wrapper=root`.
/// The JSON path feeds the same raw structs after list coercion.
#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(default, rename = "build")]
    builds: Vec<RawBuild>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBuild {
    number: Option<u64>,
    building: Option<bool>,
    result: Option<String>,
    timestamp: Option<i64>,
    duration: Option<i64>,
    #[serde(rename = "action", alias = "actions")]
    actions: Vec<RawAction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAction {
    #[serde(rename = "@_class", alias = "_class")]
    class: Option<String>,
    #[serde(rename = "parameter", alias = "parameters")]
    parameters: Vec<RawParameter>,
    #[serde(rename = "failCount")]
    fail_count: Option<i64>,
    #[serde(rename = "skipCount")]
    skip_count: Option<i64>,
    #[serde(rename = "totalCount")]
    total_count: Option<i64>,
    #[serde(rename = "urlName")]
    url_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParameter {
    name: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    value: Option<String>,
}

/// Parameter values arrive as strings in XML but may be booleans or numbers
/// in JSON; render them all as strings.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a string, boolean, number, or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        // quick-xml hands elements to deserialize_any as maps, with text
        // content under the "$text" key and attributes under "@" keys
        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let mut text = None;
            while let Some(key) = access.next_key::<String>()? {
                if key == "$text" {
                    text = Some(access.next_value::<String>()?);
                } else {
                    access.next_value::<de::IgnoredAny>()?;
                }
            }
            Ok(text)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(
            self,
            deserializer: D2,
        ) -> std::result::Result<Self::Value, D2::Error> {
            deserializer.deserialize_any(ScalarVisitor)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML_LISTING: &str = r#"<root>
  <build>
    <action _class="hudson.model.ParametersAction">
      <parameter _class="hudson.model.StringParameterValue">
        <name>OCS_REGISTRY_IMAGE</name>
        <value>quay.io/foo:4.9.0-123</value>
      </parameter>
      <parameter _class="hudson.model.BooleanParameterValue">
        <name>DRY_RUN</name>
        <value>false</value>
      </parameter>
    </action>
    <action _class="hudson.tasks.junit.TestResultAction">
      <failCount>3</failCount>
      <skipCount>2</skipCount>
      <totalCount>125</totalCount>
      <urlName>testReport</urlName>
    </action>
    <action/>
    <building>false</building>
    <duration>5400000</duration>
    <number>42</number>
    <result>SUCCESS</result>
    <timestamp>1630000000000</timestamp>
  </build>
  <build>
    <building>true</building>
    <duration>0</duration>
    <number>43</number>
    <result>FAILURE</result>
    <timestamp>1630000100000</timestamp>
  </build>
</root>"#;

    #[test]
    fn test_normalize_xml_listing() {
        let records = normalize(XML_LISTING, "ocs-ci").unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id(), "ocs-ci/42");
        assert_eq!(first.status, BuildStatus::Success);
        assert_eq!(first.timestamp, 1_630_000_000_000);
        assert_eq!(first.duration_ms, Some(5_400_000));
        assert_eq!(
            first.parameters.get("OCS_REGISTRY_IMAGE").map(String::as_str),
            Some("quay.io/foo:4.9.0-123")
        );
        assert_eq!(first.parameters.get("DRY_RUN").map(String::as_str), Some("false"));
        assert_eq!(first.test_report_path.as_deref(), Some("testReport"));

        let summary = first.test_summary.unwrap();
        assert_eq!(summary.fail, 3);
        assert_eq!(summary.skip, 2);
        assert_eq!(summary.total, 125);
        // pass is derived, never read from upstream
        assert_eq!(summary.pass, 120);
    }

    #[test]
    fn test_building_flag_beats_result_field() {
        let records = normalize(XML_LISTING, "ocs-ci").unwrap();
        let running = &records[1];
        assert_eq!(running.status, BuildStatus::Running);
        assert_eq!(running.duration_ms, None);
        assert!(running.parameters.is_empty());
    }

    #[test]
    fn test_xml_parameter_values_with_attributes_and_empty_elements() {
        // quick-xml presents these value elements as maps (attributes plus
        // text content), not plain strings; both forms must normalize
        let raw = r#"<root>
  <build>
    <action _class="hudson.model.ParametersAction">
      <parameter _class="hudson.model.StringParameterValue">
        <name>OCS_REGISTRY_IMAGE</name>
        <value _class="java.lang.String">quay.io/foo:4.9.0-123</value>
      </parameter>
      <parameter _class="hudson.model.StringParameterValue">
        <name>EMPTY_PARAM</name>
        <value/>
      </parameter>
    </action>
    <building>false</building>
    <number>42</number>
    <result>SUCCESS</result>
    <timestamp>1630000000000</timestamp>
  </build>
</root>"#;

        let records = normalize(raw, "ocs-ci").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].parameters.get("OCS_REGISTRY_IMAGE").map(String::as_str),
            Some("quay.io/foo:4.9.0-123")
        );
        // a valueless parameter never fails the build; at most it
        // surfaces as an empty string
        assert_eq!(
            records[0].parameters.get("EMPTY_PARAM").map(String::as_str).unwrap_or(""),
            ""
        );
    }

    #[test]
    fn test_normalize_json_listing() {
        let raw = r#"{
          "builds": [
            {
              "number": 7,
              "building": false,
              "result": "UNSTABLE",
              "timestamp": 1630000200000,
              "duration": 90000,
              "actions": [
                {
                  "_class": "hudson.model.ParametersAction",
                  "parameters": [
                    {"name": "OCS_REGISTRY_IMAGE", "value": "quay.io/foo:4.10.0-5"},
                    {"name": "RETRIES", "value": 3}
                  ]
                }
              ]
            }
          ]
        }"#;

        let records = normalize(raw, "ocs-ci-kvm").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, BuildStatus::Unstable);
        assert_eq!(records[0].parameters.get("RETRIES").map(String::as_str), Some("3"));
        assert!(records[0].test_summary.is_none());
    }

    #[test]
    fn test_single_build_object_is_coerced_to_list() {
        let raw = r#"{"root": {"build": {"number": 1, "timestamp": 1630000000000, "building": false, "result": "SUCCESS"}}}"#;
        let records = normalize(raw, "ocs-ci").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, 1);
    }

    #[test]
    fn test_coerce_build_list() {
        assert!(coerce_build_list(Value::Null).is_empty());
        assert_eq!(coerce_build_list(serde_json::json!([1, 2])).len(), 2);
        assert_eq!(coerce_build_list(serde_json::json!({"number": 1})).len(), 1);
    }

    #[test]
    fn test_empty_listing() {
        assert!(normalize("<root></root>", "ocs-ci").unwrap().is_empty());
        assert!(normalize(r#"{"builds": []}"#, "ocs-ci").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_build_is_skipped_not_fatal() {
        let raw = r#"{"builds": [
          {"building": false, "result": "SUCCESS", "timestamp": 1630000000000},
          {"number": 9, "building": false, "result": "SUCCESS", "timestamp": 1630000000001}
        ]}"#;
        let records = normalize(raw, "ocs-ci").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, 9);
    }

    #[test]
    fn test_unparseable_payload_fails_the_job() {
        assert!(normalize("not xml or json", "ocs-ci").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(derive_status(true, Some("SUCCESS")), BuildStatus::Running);
        assert_eq!(derive_status(false, Some("aborted")), BuildStatus::Aborted);
        assert_eq!(derive_status(false, Some("NOT_BUILT")), BuildStatus::Unknown);
        assert_eq!(derive_status(false, None), BuildStatus::Unknown);
    }
}
