use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::config::CaptionSettings;
use crate::foundation::error::{ReelError, ReelResult};

/// Narration for one job: optional full script text plus ordered scenes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NarrationScript {
    /// Full narration text. Preferred over the scenes when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Scenes in narration order.
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// One narration scene.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Spoken text.
    #[serde(alias = "text")]
    pub narration: String,
    /// Upstream image-sourcing hint; unused by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

impl NarrationScript {
    /// Script made of plain scene texts.
    pub fn from_scenes<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: None,
            scenes: texts
                .into_iter()
                .map(|t| Scene {
                    narration: t.into(),
                    visual_description: None,
                })
                .collect(),
        }
    }

    /// Load a script from JSON: either `{ "script": .., "scenes": [..] }` or a bare scene array.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read narration script '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Parse a script from JSON.
    pub fn from_json_str(raw: &str) -> ReelResult<Self> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Full(NarrationScript),
            Scenes(Vec<Scene>),
        }
        match serde_json::from_str::<Repr>(raw) {
            Ok(Repr::Full(s)) => Ok(s),
            Ok(Repr::Scenes(scenes)) => Ok(Self {
                script: None,
                scenes,
            }),
            Err(e) => Err(ReelError::serde(format!("invalid narration script: {e}"))),
        }
    }

    /// Text used for captions: the full script, or the scenes joined in order.
    pub fn narration_text(&self) -> String {
        match self.script.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_owned(),
            _ => self
                .scenes
                .iter()
                .map(|s| s.narration.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A timed caption.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CaptionCue {
    /// 1-based sequence number.
    pub index: usize,
    /// Start time in seconds.
    pub start_sec: f64,
    /// End time in seconds.
    pub end_sec: f64,
    /// Displayed phrase.
    pub text: String,
}

/// Uppercase `word` when its letters contain any emphasis keyword (case-insensitive).
pub fn emphasize(word: &str, keywords: &[String]) -> String {
    let clean = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if !clean.is_empty()
        && keywords
            .iter()
            .any(|k| !k.is_empty() && clean.contains(&k.to_lowercase()))
    {
        word.to_uppercase()
    } else {
        word.to_owned()
    }
}

/// Split narration into phrases of `words_per_cue` words.
pub fn chunk_words(text: &str, settings: &CaptionSettings) -> Vec<String> {
    let per = settings.words_per_cue.max(1);
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            if settings.emphasis {
                emphasize(w, &settings.emphasis_keywords)
            } else {
                w.to_owned()
            }
        })
        .collect();
    words.chunks(per).map(|c| c.join(" ")).collect()
}

/// Spread phrases evenly over the audio, delayed by the lead-in.
///
/// Each phrase gets `audio_duration / phrase_count` seconds. Cues starting at or after the end of
/// the audio are dropped and the last surviving cue ends exactly at the audio duration or earlier.
pub fn generate_cues(text: &str, audio_duration: f64, settings: &CaptionSettings) -> Vec<CaptionCue> {
    if !audio_duration.is_finite() || audio_duration <= 0.0 {
        return Vec::new();
    }
    let chunks = chunk_words(text, settings);
    if chunks.is_empty() {
        return Vec::new();
    }

    let span = audio_duration / chunks.len() as f64;
    let lead = settings.lead_in_sec.max(0.0);
    let mut cues = Vec::with_capacity(chunks.len());
    for (i, text) in chunks.into_iter().enumerate() {
        let start = i as f64 * span + lead;
        if start >= audio_duration {
            break;
        }
        let end = ((i + 1) as f64 * span + lead).min(audio_duration);
        cues.push(CaptionCue {
            index: cues.len() + 1,
            start_sec: start,
            end_sec: end,
            text,
        });
    }
    cues
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`), truncating to the millisecond.
pub fn srt_timestamp(sec: f64) -> String {
    let total_ms = (sec.max(0.0) * 1000.0 + 1e-6).floor() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// Render cues as SRT text.
pub fn to_srt(cues: &[CaptionCue]) -> String {
    let mut out = String::new();
    for c in cues {
        let _ = writeln!(out, "{}", c.index);
        let _ = writeln!(
            out,
            "{} --> {}",
            srt_timestamp(c.start_sec),
            srt_timestamp(c.end_sec)
        );
        let _ = writeln!(out, "{}", c.text.trim());
        out.push('\n');
    }
    out
}

fn parse_timestamp(s: &str) -> Option<f64> {
    let (hms, ms) = s.trim().split_once([',', '.'])?;
    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let sec: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m >= 60 || sec >= 60 || ms.len() != 3 {
        return None;
    }
    let ms: u64 = ms.parse().ok()?;
    Some((h * 3600 + m * 60 + sec) as f64 + ms as f64 / 1000.0)
}

/// Group lines into blocks; any whitespace-only line is a separator.
fn srt_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Parse an SRT document, validating timing.
pub fn parse_srt(raw: &str) -> ReelResult<Vec<CaptionCue>> {
    let mut cues = Vec::new();
    for (block_no, block) in srt_blocks(raw.trim_start_matches('\u{feff}')).into_iter().enumerate() {
        let bad = |what: &str| ReelError::validation(format!("subtitle block {}: {what}", block_no + 1));
        let mut lines = block.into_iter();
        let first = lines.next().ok_or_else(|| bad("empty block"))?;
        // The sequence number is optional in practice; accept a timing line first.
        let timing = if first.contains("-->") {
            first
        } else {
            lines.next().ok_or_else(|| bad("missing timing line"))?
        };
        let (a, b) = timing.split_once("-->").ok_or_else(|| bad("missing '-->'"))?;
        let start = parse_timestamp(a).ok_or_else(|| bad("bad start timestamp"))?;
        // Drop trailing position hints after the end timestamp.
        let end_raw = b.split_whitespace().next().unwrap_or_default();
        let end = parse_timestamp(end_raw).ok_or_else(|| bad("bad end timestamp"))?;
        if end < start {
            return Err(bad("cue ends before it starts"));
        }
        let text = lines.collect::<Vec<_>>().join("\n");
        cues.push(CaptionCue {
            index: cues.len() + 1,
            start_sec: start,
            end_sec: end,
            text,
        });
    }
    if cues.is_empty() {
        return Err(ReelError::validation("subtitle file contains no cues"));
    }
    Ok(cues)
}

/// Sort cues, trim overlaps and drop or clamp anything past `audio_duration`.
pub fn clamp_cues(mut cues: Vec<CaptionCue>, audio_duration: f64) -> Vec<CaptionCue> {
    cues.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
    let mut out: Vec<CaptionCue> = Vec::with_capacity(cues.len());
    for mut c in cues {
        if c.start_sec >= audio_duration {
            break;
        }
        if let Some(prev) = out.last_mut()
            && prev.end_sec > c.start_sec
        {
            prev.end_sec = c.start_sec;
        }
        c.end_sec = c.end_sec.min(audio_duration);
        c.index = out.len() + 1;
        out.push(c);
    }
    out.retain(|c| c.end_sec > c.start_sec);
    for (i, c) in out.iter_mut().enumerate() {
        c.index = i + 1;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/captions/cues.rs"]
mod tests;
