//! Tagged JSON Interchange
//!
//! Every structured record is written as a JSON object carrying its type
//! name under `"type"`, so a document can be decoded without guessing from
//! field shapes:
//!
//! ```json
//! {
//!   "type": "Measurement",
//!   "metric": { "type": "MetricIdentity", "label": "whisper", "sub_label": "inferencing", ... },
//!   "raw_metrics": [0.0213, 0.0198],
//!   "per_run": 1,
//!   "units": "s",
//!   "metadata": null
//! }
//! ```
//!
//! Lazily computed statistics are never written; they are recomputed after
//! decoding.

use crate::error::SerializationError;
use crate::results::{Results, format_timestamp, parse_timestamp};
use inferbench_stats::{Measurement, MetricIdentity};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::num::NonZeroU32;
use std::path::Path;

/// Key holding the type discriminator
pub const TYPE_KEY: &str = "type";

/// Type names [`decode_any`] recognises
pub const REGISTERED_TYPES: &[&str] = &[
    MetricIdentity::TYPE_NAME,
    Measurement::TYPE_NAME,
    Results::TYPE_NAME,
];

/// A record with a type discriminator.
///
/// Any type implementing this round-trips through [`dumps`] and [`loads`];
/// only the built-in records are known to [`decode_any`].
pub trait Tagged: Sized {
    /// Discriminator written under [`TYPE_KEY`]
    const TYPE_NAME: &'static str;

    /// Fields of this record, without the discriminator
    fn encode_fields(&self) -> Map<String, Value>;

    /// Reject values JSON cannot represent, such as non-finite floats
    fn validate(&self) -> Result<(), SerializationError> {
        Ok(())
    }

    /// Rebuild the record from its fields
    fn decode_fields(fields: &Map<String, Value>) -> Result<Self, SerializationError>;
}

/// Any decodable record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A metric identity node
    MetricIdentity(MetricIdentity),
    /// A measurement node
    Measurement(Measurement),
    /// A results node
    Results(Results),
}

/// Encode a record with its discriminator
pub fn encode<T: Tagged>(value: &T) -> Value {
    let mut fields = Map::new();
    fields.insert(TYPE_KEY.to_string(), Value::String(T::TYPE_NAME.to_string()));
    fields.extend(value.encode_fields());
    Value::Object(fields)
}

/// Decode a node that must be of type `T`
pub fn decode<T: Tagged>(value: &Value) -> Result<T, SerializationError> {
    let (type_name, fields) = tagged_fields(value)?;
    if type_name != T::TYPE_NAME {
        return Err(SerializationError::UnexpectedType {
            expected: T::TYPE_NAME,
            found: type_name.to_string(),
        });
    }
    T::decode_fields(fields)
}

/// Decode any node whose type is in [`REGISTERED_TYPES`]
pub fn decode_any(value: &Value) -> Result<Record, SerializationError> {
    let (type_name, fields) = tagged_fields(value)?;
    if type_name == MetricIdentity::TYPE_NAME {
        MetricIdentity::decode_fields(fields).map(Record::MetricIdentity)
    } else if type_name == Measurement::TYPE_NAME {
        Measurement::decode_fields(fields).map(Record::Measurement)
    } else if type_name == Results::TYPE_NAME {
        Results::decode_fields(fields).map(Record::Results)
    } else {
        Err(SerializationError::UnknownType(type_name.to_string()))
    }
}

fn tagged_fields(value: &Value) -> Result<(&str, &Map<String, Value>), SerializationError> {
    let fields = value.as_object().ok_or(SerializationError::MissingType)?;
    let type_name = match fields.get(TYPE_KEY) {
        Some(Value::String(name)) => name.as_str(),
        _ => return Err(SerializationError::MissingType),
    };
    Ok((type_name, fields))
}

/// Encode to a pretty-printed string
pub fn dumps<T: Tagged>(value: &T) -> Result<String, SerializationError> {
    value.validate()?;
    Ok(serde_json::to_string_pretty(&encode(value))?)
}

/// Encode into a writer
pub fn dump<T: Tagged, W: Write>(value: &T, writer: W) -> Result<(), SerializationError> {
    value.validate()?;
    Ok(serde_json::to_writer_pretty(writer, &encode(value))?)
}

fn finite(owner: &'static str, field: &'static str, values: &[f64]) -> Result<(), SerializationError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(SerializationError::Field {
            owner,
            field,
            message: format!("cannot encode non-finite value {}", v),
        }),
        None => Ok(()),
    }
}

/// Decode from a string
pub fn loads<T: Tagged>(s: &str) -> Result<T, SerializationError> {
    decode(&serde_json::from_str::<Value>(s)?)
}

/// Decode from a reader
pub fn load<T: Tagged, R: Read>(reader: R) -> Result<T, SerializationError> {
    decode(&serde_json::from_reader::<_, Value>(reader)?)
}

/// Write a results file
pub fn save_results(results: &Results, path: impl AsRef<Path>) -> Result<(), SerializationError> {
    let path = path.as_ref();
    let io_error = |source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    dump(results, &mut writer)?;
    writer.flush().map_err(io_error)
}

/// Read a results file
pub fn load_results(path: impl AsRef<Path>) -> Result<Results, SerializationError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(BufReader::new(file))
}

impl Tagged for MetricIdentity {
    const TYPE_NAME: &'static str = "MetricIdentity";

    fn encode_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("label".into(), opt_string(&self.label));
        fields.insert("sub_label".into(), opt_string(&self.sub_label));
        fields.insert("description".into(), opt_string(&self.description));
        fields.insert("device".into(), opt_string(&self.device));
        fields.insert("env".into(), opt_string(&self.env));
        fields
    }

    fn decode_fields(fields: &Map<String, Value>) -> Result<Self, SerializationError> {
        let read = FieldReader::new(Self::TYPE_NAME, fields);
        Ok(Self {
            label: read.opt_string("label")?,
            sub_label: read.opt_string("sub_label")?,
            description: read.opt_string("description")?,
            device: read.opt_string("device")?,
            env: read.opt_string("env")?,
        })
    }
}

impl Tagged for Measurement {
    const TYPE_NAME: &'static str = "Measurement";

    fn encode_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("metric".into(), encode(self.metric()));
        fields.insert("raw_metrics".into(), self.raw_samples().into());
        fields.insert("per_run".into(), self.per_run().get().into());
        fields.insert("units".into(), self.units().into());
        fields.insert(
            "metadata".into(),
            self.metadata().cloned().map_or(Value::Null, Value::Object),
        );
        fields
    }

    fn validate(&self) -> Result<(), SerializationError> {
        finite(Self::TYPE_NAME, "raw_metrics", self.raw_samples())
    }

    fn decode_fields(fields: &Map<String, Value>) -> Result<Self, SerializationError> {
        let read = FieldReader::new(Self::TYPE_NAME, fields);

        let metric = decode::<MetricIdentity>(read.required("metric")?)?;
        let samples = read.floats("raw_metrics")?;
        let per_run = match read.opt_u64("per_run")? {
            None => NonZeroU32::MIN,
            Some(n) => u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| read.invalid("per_run", "must be a positive 32-bit integer"))?,
        };

        let mut measurement = Measurement::new(metric, samples).with_per_run(per_run);
        if let Some(units) = read.opt_string("units")? {
            measurement = measurement.with_units(units);
        }
        match fields.get("metadata") {
            None | Some(Value::Null) => {}
            Some(Value::Object(metadata)) => measurement = measurement.with_metadata(metadata.clone()),
            Some(_) => return Err(read.invalid("metadata", "must be an object or null")),
        }
        Ok(measurement)
    }
}

impl Tagged for Results {
    const TYPE_NAME: &'static str = "Results";

    fn encode_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("n_runs".into(), self.n_runs.into());
        fields.insert("benchmarks".into(), self.benchmarks.clone().into());
        fields.insert("started".into(), format_timestamp(&self.started).into());
        fields.insert("errors".into(), self.errors.clone().into());
        fields.insert("limit".into(), self.limit.into());
        fields.insert("duration".into(), self.duration.into());
        fields.insert("env".into(), opt_string(&self.env));
        fields.insert("device".into(), opt_string(&self.device));
        fields.insert("options".into(), Value::Object(self.options.clone()));
        fields.insert("successes".into(), self.successes.into());
        fields.insert("failures".into(), self.failures.into());
        fields.insert(
            "measurements".into(),
            self.measurements
                .as_ref()
                .map_or(Value::Null, |ms| Value::Array(ms.iter().map(encode).collect())),
        );
        fields
    }

    fn validate(&self) -> Result<(), SerializationError> {
        if let Some(duration) = self.duration {
            finite(Self::TYPE_NAME, "duration", &[duration])?;
        }
        self.measurements
            .iter()
            .flatten()
            .try_for_each(|m| m.validate())
    }

    fn decode_fields(fields: &Map<String, Value>) -> Result<Self, SerializationError> {
        let read = FieldReader::new(Self::TYPE_NAME, fields);

        let n_runs = read
            .opt_u64("n_runs")?
            .ok_or_else(|| read.invalid("n_runs", "is required"))?;
        let n_runs = u32::try_from(n_runs).map_err(|_| read.invalid("n_runs", "is out of range"))?;

        let started = read
            .opt_string("started")?
            .ok_or_else(|| read.invalid("started", "is required"))?;
        let started = parse_timestamp(&started)
            .ok_or_else(|| read.invalid("started", format!("cannot parse timestamp {}", started)))?;

        let options = match fields.get("options") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(options)) => options.clone(),
            Some(_) => return Err(read.invalid("options", "must be an object or null")),
        };

        let measurements = match fields.get("measurements") {
            None | Some(Value::Null) => None,
            Some(Value::Array(nodes)) => Some(
                nodes
                    .iter()
                    .map(decode::<Measurement>)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(read.invalid("measurements", "must be a list or null")),
        };

        Ok(Self {
            n_runs,
            benchmarks: read.strings("benchmarks")?,
            started,
            errors: read.strings("errors")?,
            limit: read.opt_i64("limit")?,
            duration: read.opt_f64("duration")?,
            env: read.opt_string("env")?,
            device: read.opt_string("device")?,
            options,
            successes: read.opt_u64("successes")?.unwrap_or(0),
            failures: read.opt_u64("failures")?.unwrap_or(0),
            measurements,
        })
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.as_deref().map_or(Value::Null, Value::from)
}

/// Typed field access with uniform error reporting
struct FieldReader<'a> {
    owner: &'static str,
    fields: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    fn new(owner: &'static str, fields: &'a Map<String, Value>) -> Self {
        Self { owner, fields }
    }

    fn invalid(&self, field: &'static str, message: impl Into<String>) -> SerializationError {
        SerializationError::Field {
            owner: self.owner,
            field,
            message: message.into(),
        }
    }

    fn present(&self, field: &'static str) -> Option<&'a Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &'static str) -> Result<&'a Value, SerializationError> {
        self.present(field).ok_or_else(|| self.invalid(field, "is required"))
    }

    fn opt_string(&self, field: &'static str) -> Result<Option<String>, SerializationError> {
        self.present(field)
            .map(|v| {
                v.as_str()
                    .map(String::from)
                    .ok_or_else(|| self.invalid(field, "must be a string"))
            })
            .transpose()
    }

    fn opt_u64(&self, field: &'static str) -> Result<Option<u64>, SerializationError> {
        self.present(field)
            .map(|v| v.as_u64().ok_or_else(|| self.invalid(field, "must be a non-negative integer")))
            .transpose()
    }

    fn opt_i64(&self, field: &'static str) -> Result<Option<i64>, SerializationError> {
        self.present(field)
            .map(|v| v.as_i64().ok_or_else(|| self.invalid(field, "must be an integer")))
            .transpose()
    }

    fn opt_f64(&self, field: &'static str) -> Result<Option<f64>, SerializationError> {
        self.present(field)
            .map(|v| v.as_f64().ok_or_else(|| self.invalid(field, "must be a number")))
            .transpose()
    }

    fn floats(&self, field: &'static str) -> Result<Vec<f64>, SerializationError> {
        let Some(value) = self.present(field) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(field, "must be a list of numbers"))?;
        items
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| self.invalid(field, "must be a list of numbers")))
            .collect()
    }

    fn strings(&self, field: &'static str) -> Result<Vec<String>, SerializationError> {
        let Some(value) = self.present(field) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(field, "must be a list of strings"))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(String::from)
                    .ok_or_else(|| self.invalid(field, "must be a list of strings"))
            })
            .collect()
    }
}
