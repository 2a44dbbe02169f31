//! Typed ffmpeg filtergraph model.
//!
//! Graph text is produced only by the `Display` impls here, so numeric parameters stay
//! structured until serialization and quoting is handled in one place.

use std::fmt;
use std::path::Path;

/// A link label such as `[0:v]` or `[bg3]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pad(String);

impl Pad {
    /// Video stream of input file `i`.
    pub fn input_video(i: usize) -> Self {
        Self(format!("{i}:v"))
    }

    /// Named intermediate link.
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Label text without brackets (usable with `-map [label]`).
    pub fn label(&self) -> &str {
        &self.0
    }

    /// Bracketed form for `-map`.
    pub fn map_arg(&self) -> String {
        format!("[{}]", self.0)
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Arg {
    Positional(String),
    Named(&'static str, String),
}

/// One filter with its options.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    name: &'static str,
    args: Vec<Arg>,
}

impl Filter {
    /// Filter with no options yet.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Filter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Positional option.
    pub fn pos(mut self, v: impl fmt::Display) -> Self {
        self.args.push(Arg::Positional(v.to_string()));
        self
    }

    /// `key=value` option.
    pub fn kv(mut self, key: &'static str, v: impl fmt::Display) -> Self {
        self.args.push(Arg::Named(key, v.to_string()));
        self
    }

    /// `key='expr'` option; the expression is quoted so commas inside it survive.
    pub fn expr(mut self, key: &'static str, e: &str) -> Self {
        self.args.push(Arg::Named(key, quote(e)));
        self
    }

    /// Value of a named option, as serialized.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|a| match a {
            Arg::Named(k, v) if *k == key => Some(v.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for (i, a) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match a {
                Arg::Positional(v) => f.write_str(v)?,
                Arg::Named(k, v) => write!(f, "{k}={v}")?,
            }
        }
        Ok(())
    }
}

/// A linear filter chain: `[in..]f1,f2,..[out..]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    /// Input links.
    pub inputs: Vec<Pad>,
    /// Filters applied in order.
    pub filters: Vec<Filter>,
    /// Output links.
    pub outputs: Vec<Pad>,
}

impl Chain {
    /// Chain consuming `inputs`.
    pub fn from(inputs: impl IntoIterator<Item = Pad>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            filters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append a filter.
    pub fn then(mut self, f: Filter) -> Self {
        self.filters.push(f);
        self
    }

    /// Terminate the chain at `out`.
    pub fn into_pad(mut self, out: Pad) -> Self {
        self.outputs.push(out);
        self
    }

    /// First filter with `name`.
    pub fn find(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.inputs {
            write!(f, "{p}")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for p in &self.outputs {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// A complete `-filter_complex` graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterGraph {
    /// Chains, serialized in order and joined by `;`.
    pub chains: Vec<Chain>,
}

impl FilterGraph {
    /// Append chains.
    pub fn extend(&mut self, chains: impl IntoIterator<Item = Chain>) {
        self.chains.extend(chains);
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Format a finite number compactly: at most 6 decimals, no trailing zeros.
pub fn num(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

/// Quote a value for use inside a filter option.
///
/// Backslashes are literal inside single quotes, so an embedded quote closes the
/// quoted run, is emitted escaped, and reopens it.
pub fn quote(v: &str) -> String {
    format!("'{}'", v.replace('\'', r"'\''"))
}

/// Escape a path for use as a quoted filter option value (e.g. `subtitles`).
pub fn escape_filter_path(path: &Path) -> String {
    let s = path
        .to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:");
    quote(&s)
}
