//! Decoding and inspection of GitHub Actions workflow files.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_yaml::{Mapping, Value};

use crate::error::Result;

/// Decode a base64 blob payload. The API wraps the encoded text in lines,
/// so all whitespace is dropped first.
pub fn decode_content(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// A workflow document whose top level is a mapping.
#[derive(Debug, Clone)]
pub struct ParsedWorkflow {
    root: Mapping,
}

impl ParsedWorkflow {
    /// Parse raw file bytes.
    ///
    /// Returns `Ok(None)` for documents that are not mappings (a top-level
    /// sequence, a scalar, or an empty file); those are not workflows.
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        match serde_yaml::from_slice::<Value>(bytes)? {
            Value::Mapping(root) => Ok(Some(ParsedWorkflow { root })),
            _ => Ok(None),
        }
    }

    /// Steps of every job, in document order.
    pub fn steps(&self) -> impl Iterator<Item = &Mapping> + '_ {
        self.root
            .get("jobs")
            .and_then(Value::as_mapping)
            .into_iter()
            .flat_map(|jobs| jobs.values())
            .filter_map(|job| job.get("steps").and_then(Value::as_sequence))
            .flatten()
            .filter_map(Value::as_mapping)
    }

    /// Number of steps using `action` (substring of `uses`) with `key` set
    /// under `with`.
    pub fn matching_steps(&self, action: &str, key: &str) -> usize {
        self.steps()
            .filter(|step| step_matches(step, action, key))
            .count()
    }
}

fn step_matches(step: &Mapping, action: &str, key: &str) -> bool {
    let uses = step.get("uses").and_then(Value::as_str).unwrap_or_default();
    if !uses.contains(action) {
        return false;
    }

    step.get("with")
        .and_then(Value::as_mapping)
        .is_some_and(|with| with.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTION: &str = "ChrisCarini/intellij-platform-plugin-verifier-action";
    const KEY: &str = "verifier-version";

    fn parse(doc: &str) -> Option<ParsedWorkflow> {
        ParsedWorkflow::parse(doc.as_bytes()).unwrap()
    }

    #[test]
    fn decodes_wrapped_base64() {
        let encoded = "am9iczoK\nICBidWls\nZDoge30K\n";
        assert_eq!(decode_content(encoded).unwrap(), b"jobs:\n  build: {}\n");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_content("not*base64").is_err());
    }

    #[test]
    fn sequence_documents_are_skipped() {
        let doc = format!("- uses: {ACTION}@latest\n  with:\n    {KEY}: '1.0'\n");
        assert!(parse(&doc).is_none());
        assert!(parse("").is_none());
        assert!(parse("just a string").is_none());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(ParsedWorkflow::parse(b"jobs: [unclosed").is_err());
    }

    #[test]
    fn counts_each_matching_step() {
        let doc = format!(
            r#"
name: Verify
on: [push]
jobs:
  verify:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Verify plugin
        uses: {ACTION}@latest
        with:
          {KEY}: '1.255'
          ide-versions: ideaIC:2021.1
      - name: Verify again
        uses: {ACTION}@v2
        with:
          {KEY}: '1.300'
"#
        );
        let workflow = parse(&doc).unwrap();
        assert_eq!(workflow.steps().count(), 3);
        assert_eq!(workflow.matching_steps(ACTION, KEY), 2);
    }

    #[test]
    fn both_conditions_are_required() {
        let doc = format!(
            r#"
jobs:
  a:
    steps:
      - uses: {ACTION}@latest
        with:
          ide-versions: ideaIC:2021.1
  b:
    steps:
      - uses: other/action@v1
        with:
          {KEY}: '1.0'
      - uses: {ACTION}@latest
        with: {KEY}
      - run: echo {ACTION} {KEY}
"#
        );
        assert_eq!(parse(&doc).unwrap().matching_steps(ACTION, KEY), 0);
    }

    #[test]
    fn tolerates_missing_jobs_and_steps() {
        assert_eq!(parse("name: empty\n").unwrap().matching_steps(ACTION, KEY), 0);

        let doc = format!(
            r#"
jobs:
  call:
    uses: octo/repo/.github/workflows/reusable.yml@main
  verify:
    steps:
      - uses: {ACTION}@latest
        with:
          {KEY}: '1.0'
"#
        );
        assert_eq!(parse(&doc).unwrap().matching_steps(ACTION, KEY), 1);
    }
}
