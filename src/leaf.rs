use crate::error::Error;
use crate::functions;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ordered_float::OrderedFloat;
use std::io::{Read, Write};

/// Terminal node payload, fitted from the outputs of a training subset.
pub trait Leaf: Sized {
    /// Output type of the training records.
    type Output;

    /// Value returned when an input reaches this leaf.
    type Prediction;

    /// Node tag written before the payload.
    const TAG: u8;

    /// # Panics
    ///
    /// Panics if `ys` is empty.
    fn from_outputs<T>(ys: T) -> Self
    where
        T: Iterator<Item = Self::Output> + Clone;

    fn prediction(&self) -> Self::Prediction;

    fn write_payload<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    fn read_payload<R: Read>(reader: &mut R) -> Result<Self, Error>;
}

/// A class label that can be written to and read from a byte stream.
pub trait Label: Ord + Clone + Send + Sync {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error>;
}

macro_rules! impl_integer_label {
    ($t:ty, $write:ident, $read:ident) => {
        impl Label for $t {
            fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
                writer.$write::<BigEndian>(*self)
            }

            fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
                reader.$read::<BigEndian>().map_err(Error::from_read)
            }
        }
    };
}

impl_integer_label!(u16, write_u16, read_u16);
impl_integer_label!(u32, write_u32, read_u32);
impl_integer_label!(u64, write_u64, read_u64);
impl_integer_label!(i16, write_i16, read_i16);
impl_integer_label!(i32, write_i32, read_i32);
impl_integer_label!(i64, write_i64, read_i64);

impl Label for u8 {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(*self)
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        reader.read_u8().map_err(Error::from_read)
    }
}

impl Label for i8 {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_i8(*self)
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        reader.read_i8().map_err(Error::from_read)
    }
}

impl Label for bool {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(*self as u8)
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        match reader.read_u8().map_err(Error::from_read)? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::SerializationFormat(format!(
                "invalid boolean label {}",
                v
            ))),
        }
    }
}

impl Label for char {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(*self as u32)
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let v = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
        std::char::from_u32(v)
            .ok_or_else(|| Error::SerializationFormat(format!("invalid char label {:#x}", v)))
    }
}

impl Label for String {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(self.len() as u32)?;
        writer.write_all(self.as_bytes())
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let len = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
        let mut bytes = Vec::new();
        reader
            .take(u64::from(len))
            .read_to_end(&mut bytes)
            .map_err(Error::from_read)?;
        if bytes.len() != len as usize {
            return Err(Error::SerializationFormat("truncated stream".to_owned()));
        }
        String::from_utf8(bytes)
            .map_err(|e| Error::SerializationFormat(format!("invalid string label: {}", e)))
    }
}

impl Label for OrderedFloat<f64> {
    fn write_label<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_f64::<BigEndian>(self.0)
    }

    fn read_label<R: Read>(reader: &mut R) -> Result<Self, Error> {
        reader
            .read_f64::<BigEndian>()
            .map(OrderedFloat)
            .map_err(Error::from_read)
    }
}

/// Leaf of a classification tree.
///
/// Keeps the relative frequency of every label seen in the training subset, sorted by label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationLeaf<L> {
    label: L,
    frequencies: Vec<(L, f64)>,
}

impl<L: Label> ClassificationLeaf<L> {
    /// Majority label; ties go to the smallest label.
    pub fn label(&self) -> &L {
        &self.label
    }

    /// `(label, relative frequency)` pairs in ascending label order.
    pub fn frequencies(&self) -> &[(L, f64)] {
        &self.frequencies
    }

    pub fn probability(&self, label: &L) -> f64 {
        self.frequencies
            .binary_search_by(|(l, _)| l.cmp(label))
            .map_or(0.0, |i| self.frequencies[i].1)
    }

    /// Relative frequency of the majority label.
    pub fn confidence(&self) -> f64 {
        self.probability(&self.label)
    }
}

impl<L: Label> Leaf for ClassificationLeaf<L> {
    type Output = L;
    type Prediction = L;
    const TAG: u8 = b'C';

    fn from_outputs<T>(ys: T) -> Self
    where
        T: Iterator<Item = L> + Clone,
    {
        let (histogram, n) = functions::histogram(ys);
        let label = functions::most_frequent(&histogram)
            .cloned()
            .expect("leaf built from an empty subset");
        let frequencies = histogram
            .into_iter()
            .map(|(l, count)| (l, count as f64 / n as f64))
            .collect();
        Self { label, frequencies }
    }

    fn prediction(&self) -> L {
        self.label.clone()
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(self.frequencies.len() as u32)?;
        for (label, frequency) in &self.frequencies {
            label.write_label(writer)?;
            writer.write_f64::<BigEndian>(*frequency)?;
        }
        Ok(())
    }

    fn read_payload<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let len = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
        if len == 0 {
            return Err(Error::SerializationFormat(
                "classification leaf without labels".to_owned(),
            ));
        }
        let mut frequencies = Vec::<(L, f64)>::new();
        for _ in 0..len {
            let label = L::read_label(reader)?;
            let frequency = reader.read_f64::<BigEndian>().map_err(Error::from_read)?;
            if frequencies.last().map_or(false, |(l, _)| *l >= label) {
                return Err(Error::SerializationFormat(
                    "classification leaf labels are not sorted".to_owned(),
                ));
            }
            frequencies.push((label, frequency));
        }

        let mut best = 0;
        for (i, (_, f)) in frequencies.iter().enumerate() {
            if *f > frequencies[best].1 {
                best = i;
            }
        }
        let label = frequencies[best].0.clone();
        Ok(Self { label, frequencies })
    }
}

/// Leaf of a regression tree, holding the mean output of its training subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLeaf {
    value: f64,
}

impl RegressionLeaf {
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Leaf for RegressionLeaf {
    type Output = f64;
    type Prediction = f64;
    const TAG: u8 = b'R';

    fn from_outputs<T>(ys: T) -> Self
    where
        T: Iterator<Item = f64> + Clone,
    {
        Self {
            value: functions::mean(ys),
        }
    }

    fn prediction(&self) -> f64 {
        self.value
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_f64::<BigEndian>(self.value)
    }

    fn read_payload<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let value = reader.read_f64::<BigEndian>().map_err(Error::from_read)?;
        Ok(Self { value })
    }
}
