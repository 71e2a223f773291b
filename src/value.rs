//! Generic PDF values as handed over by the object parser.

use std::collections::BTreeMap;

pub type PdfDict = BTreeMap<String, PdfValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub dict: PdfDict,
    /// Decoded (decompressed) stream bytes.
    pub data: Vec<u8>,
}

/// A PDF object with references already resolved by the caller. A
/// `Reference` that survives means the target could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(Vec<u8>),
    Name(String),
    Array(Vec<PdfValue>),
    Dict(PdfDict),
    Reference(u32, u16),
    Stream(PdfStream),
}

impl PdfValue {
    pub fn name(name: impl Into<String>) -> Self {
        PdfValue::Name(name.into())
    }

    pub fn number(n: impl Into<f64>) -> Self {
        PdfValue::Number(n.into())
    }

    pub fn numbers<N: Into<f64>>(items: impl IntoIterator<Item = N>) -> Self {
        PdfValue::Array(items.into_iter().map(|n| PdfValue::Number(n.into())).collect())
    }

    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, PdfValue)>) -> Self {
        PdfValue::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn stream<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, PdfValue)>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        PdfValue::Stream(PdfStream {
            dict: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            data: data.into(),
        })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.as_number().map(|n| n as f32)
    }

    /// A non-negative integral number.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_number()
            .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64 && n.fract() == 0.0)
            .map(|n| n as u32)
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfValue::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            PdfValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfValue]> {
        match self {
            PdfValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The dictionary of a dict or of a stream.
    pub fn as_dict(&self) -> Option<&PdfDict> {
        match self {
            PdfValue::Dict(d) => Some(d),
            PdfValue::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfValue::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PdfValue> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Fixed-size numeric array such as a matrix or bounding box.
    pub fn as_f32_array<const N: usize>(&self) -> Option<[f32; N]> {
        let items = self.as_array()?;
        if items.len() != N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f32()?;
        }
        Some(out)
    }
}
