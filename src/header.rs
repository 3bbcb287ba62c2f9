//! Typed stream header
//!
//! LSL/XDF stream headers arrive as loosely shaped trees: every field may be
//! missing, a scalar, a number, or a singleton list (the pyxdf convention),
//! and the `<channels>` container may hold one `<channel>` or a list of them.
//! [`StreamHeader`] absorbs all of that once, at ingestion, so the resolution
//! logic downstream only ever sees `Option`s.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Stream-level metadata parsed from a header tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamHeader {
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        rename = "type",
        deserialize_with = "text",
        skip_serializing_if = "Option::is_none"
    )]
    pub stream_type: Option<String>,

    /// Declared channel count, kept as declared so unparseable values can be
    /// told apart from missing ones.
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<String>,

    #[serde(default, deserialize_with = "number", skip_serializing_if = "Option::is_none")]
    pub nominal_srate: Option<f64>,

    #[serde(default, deserialize_with = "number", skip_serializing_if = "Option::is_none")]
    pub effective_srate: Option<f64>,

    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub channel_format: Option<String>,

    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    #[serde(
        default,
        alias = "description",
        deserialize_with = "node",
        skip_serializing_if = "Option::is_none"
    )]
    pub desc: Option<Description>,
}

/// The `<desc>` subtree. Only the channel container is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default, deserialize_with = "node", skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelsNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelsNode {
    /// One entry per `<channel>` element, in document order. A `null` entry
    /// keeps its slot as a descriptor without fields.
    #[serde(default, deserialize_with = "descriptors")]
    pub channel: Vec<ChannelDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, deserialize_with = "text", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(
        default,
        rename = "type",
        deserialize_with = "text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
}

impl StreamHeader {
    /// Parse a header from a JSON tree. Anything that is not an object yields
    /// an empty header rather than an error.
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Parse the LSL `<info>` XML document (as stored in XDF stream header
    /// chunks and returned by `StreamInfo::to_xml`).
    pub fn from_xml(xml: &str) -> Result<Self> {
        let tree = xml_to_tree(xml)?;
        let info = tree
            .get("info")
            .and_then(first_of)
            .ok_or_else(|| anyhow::anyhow!("Stream header XML has no <info> element"))?;
        Self::from_json(info)
    }

    /// Declared channel count, if present and a positive integer.
    pub fn declared_channel_count(&self) -> Option<usize> {
        self.channel_count
            .as_deref()
            .and_then(|count| count.trim().parse::<usize>().ok())
            .filter(|&count| count > 0)
    }

    /// Per-channel descriptors under `desc/channels/channel`, if the header
    /// has that container at all.
    pub fn channel_descriptors(&self) -> Option<&[ChannelDescriptor]> {
        self.desc
            .as_ref()
            .and_then(|desc| desc.channels.as_ref())
            .map(|channels| channels.channel.as_slice())
    }

    /// Effective sampling rate in Hz; zero or negative rates count as unknown.
    pub fn effective_rate(&self) -> Option<f64> {
        self.effective_srate.filter(|rate| *rate > 0.0)
    }
}

/// Text of a leaf value: strings as-is, numbers and booleans printed, lists
/// reduced to their first element. Empty text counts as absent.
fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.first().and_then(leaf_text),
        Value::Null | Value::Object(_) => None,
    }
}

fn first_of(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(leaf_text(&value))
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match first_of(&value) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|rate| rate.is_finite()))
}

/// A nested node: an object, or a list whose first element is one.
fn node<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match first_of(&value) {
        Some(inner @ Value::Object(_)) => serde_json::from_value(inner.clone())
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A single descriptor object or a list of them.
fn descriptors<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ChannelDescriptor>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => serde_json::from_value(item).map_err(serde::de::Error::custom),
            _ => Ok(ChannelDescriptor::default()),
        })
        .collect()
}

/// Convert an XML document into the pyxdf-style tree: every element maps
/// child names to lists of children, leaves become their text, and empty
/// leaves become `null`.
fn xml_to_tree(xml: &str) -> Result<Value> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // (element name, children, accumulated text)
    let mut stack: Vec<(String, Map<String, Value>, String)> =
        vec![(String::new(), Map::new(), String::new())];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push((name, Map::new(), String::new()));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some((_, children, _)) = stack.last_mut() {
                    push_child(children, name, Value::Null);
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if let Some((_, _, buffer)) = stack.last_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some((_, _, buffer)) = stack.last_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(anyhow::anyhow!("Unbalanced closing tag in stream header XML"));
                }
                let Some((name, children, text)) = stack.pop() else {
                    break;
                };
                let value = if !children.is_empty() {
                    Value::Object(children)
                } else if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text)
                };
                if let Some((_, parent, _)) = stack.last_mut() {
                    push_child(parent, name, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(anyhow::anyhow!("Unclosed element in stream header XML"));
    }
    let (_, root, _) = stack.remove(0);
    Ok(Value::Object(root))
}

fn push_child(children: &mut Map<String, Value>, name: String, value: Value) {
    let slot = children
        .entry(name)
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = slot {
        items.push(value);
    }
}
