use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const OUTPUT_PRETTY: &str =
  "output.pretty";
pub const PROJECTION_SKIP_INVALID: &str =
  "projection.skip_invalid";
pub const DRAFT_FREQUENCY_MAX: &str =
  "draft.frequency.max";

const KNOWN_KEYS: [&str; 3] = [
  OUTPUT_PRETTY,
  PROJECTION_SKIP_INVALID,
  DRAFT_FREQUENCY_MAX
];

const AGENDARC_ENV_VAR: &str = "AGENDARC";
const AGENDARC_FILE: &str = ".agendarc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      OUTPUT_PRETTY.to_string(),
      "on".to_string()
    );
    map.insert(
      PROJECTION_SKIP_INVALID.to_string(),
      "on".to_string()
    );
    map.insert(
      DRAFT_FREQUENCY_MAX.to_string(),
      "10".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    agendarc_override
  ))]
  pub fn load(
    agendarc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let agendarc = resolve_agendarc_path(
      agendarc_override
    )?;
    if let Some(path) = agendarc {
      info!(agendarc = %path.display(), "loading agendarc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no agendarc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_i64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<i64>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<i64>().with_context(
          || {
            format!(
              "config key {key} expects an \
               integer, got {v:?}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    self.load_chain(
      &expand_tilde(path),
      &mut Vec::new()
    )
  }

  /// `chain` holds the canonical paths of the
  /// files currently being read, outermost first.
  #[tracing::instrument(skip(self, chain))]
  fn load_chain(
    &mut self,
    path: &Path,
    chain: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let canonical = fs::canonicalize(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    if chain.contains(&canonical) {
      let cycle = chain
        .iter()
        .skip_while(|seen| **seen != canonical)
        .chain([&canonical])
        .map(|seen| seen.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
      return Err(anyhow!(
        "include cycle: {cycle}"
      ));
    }

    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    self.loaded_files.push(path.to_path_buf());
    chain.push(canonical);

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let at = || {
        format!(
          "{}:{}",
          path.display(),
          line_num + 1
        )
      };
      match parse_rc_line(raw_line) {
        | RcLine::Blank => {}
        | RcLine::Include(target) => {
          let include_path =
            resolve_include_path(
              &base_dir, target
            )
            .with_context(at)?;
          debug!(
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
          );
          if include_path.exists() {
            self.load_chain(
              &include_path,
              chain
            )?;
          } else {
            warn!(include = %include_path.display(), "include file does not exist; skipping");
          }
        }
        | RcLine::Setting(key, value) => {
          if !KNOWN_KEYS.contains(&key) {
            warn!(key, at = %at(), "unknown agendarc key");
          }
          trace!(key, value, "loaded config key");
          self
            .map
            .insert(key.to_string(), value.to_string());
        }
        | RcLine::Invalid => {
          return Err(anyhow!(
            "invalid config line {}: {}",
            at(),
            raw_line
          ));
        }
      }
    }

    chain.pop();
    Ok(())
  }
}

enum RcLine<'a> {
  Blank,
  Include(&'a str),
  Setting(&'a str, &'a str),
  Invalid
}

/// One agendarc line with any `#` comment
/// removed.
fn parse_rc_line(raw: &str) -> RcLine<'_> {
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();
  if line.is_empty() {
    return RcLine::Blank;
  }
  if let Some(target) =
    line.strip_prefix("include ")
  {
    return RcLine::Include(target.trim());
  }
  match line.split_once('=') {
    | Some((key, value)) => RcLine::Setting(
      key.trim(),
      value.trim()
    ),
    | None => RcLine::Invalid
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_agendarc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(agendarc_env) =
    std::env::var(AGENDARC_ENV_VAR)
  {
    if agendarc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      agendarc_env
    )));
  }

  let Some(home) = dirs::home_dir() else {
    warn!(
      "cannot determine home directory; \
       skipping {AGENDARC_FILE}"
    );
    return Ok(None);
  };
  let candidate = home.join(AGENDARC_FILE);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
