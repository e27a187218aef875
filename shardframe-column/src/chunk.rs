//! Element kinds, decoded chunk payloads, and per-row values.
//!
//! The element kind is a closed variant; every site that branches on it (the
//! split row copy, CSV formatting, row display) matches exhaustively so a new
//! kind cannot be added without revisiting them.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, UInt32Array};
use arrow::datatypes::DataType;
use shardframe_result::{Error, Result};
use std::sync::Arc;

/// Element kind of a column. `Categorical` carries the dictionary of category
/// labels; stored values are codes indexing into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Integer,
    Categorical(Arc<[String]>),
}

impl ColumnType {
    /// Dictionary of category labels, present iff categorical.
    pub fn domain(&self) -> Option<&Arc<[String]>> {
        match self {
            ColumnType::Categorical(domain) => Some(domain),
            ColumnType::Numeric | ColumnType::Integer => None,
        }
    }

    /// Physical Arrow type backing chunks of this kind.
    pub fn storage_type(&self) -> DataType {
        match self {
            ColumnType::Numeric => DataType::Float64,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Categorical(_) => DataType::UInt32,
        }
    }
}

/// One read value. Missing status is explicit and must survive every copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Missing,
    Numeric(f64),
    Integer(i64),
    Code(u32),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// Decoded payload of one chunk; missing values are Arrow nulls.
#[derive(Clone, Debug)]
pub enum ChunkData {
    Numeric(Float64Array),
    Integer(Int64Array),
    Codes(UInt32Array),
}

impl ChunkData {
    /// Reinterpret a deserialized Arrow array as a chunk of the given kind.
    pub fn from_array(ty: &ColumnType, array: ArrayRef) -> Result<Self> {
        match ty {
            ColumnType::Numeric => array
                .as_any()
                .downcast_ref::<Float64Array>()
                .cloned()
                .map(ChunkData::Numeric),
            ColumnType::Integer => array
                .as_any()
                .downcast_ref::<Int64Array>()
                .cloned()
                .map(ChunkData::Integer),
            ColumnType::Categorical(_) => array
                .as_any()
                .downcast_ref::<UInt32Array>()
                .cloned()
                .map(ChunkData::Codes),
        }
        .ok_or_else(|| {
            Error::Internal(format!(
                "chunk payload {:?} does not match column kind {:?}",
                array.data_type(),
                ty
            ))
        })
    }

    pub fn len(&self) -> usize {
        match self {
            ChunkData::Numeric(a) => a.len(),
            ChunkData::Integer(a) => a.len(),
            ChunkData::Codes(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            ChunkData::Numeric(a) => a.is_null(idx),
            ChunkData::Integer(a) => a.is_null(idx),
            ChunkData::Codes(a) => a.is_null(idx),
        }
    }

    /// Read one value within this chunk, by chunk-local row index.
    pub fn value(&self, idx: usize) -> Value {
        match self {
            ChunkData::Numeric(a) => {
                if a.is_null(idx) {
                    Value::Missing
                } else {
                    Value::Numeric(a.value(idx))
                }
            }
            ChunkData::Integer(a) => {
                if a.is_null(idx) {
                    Value::Missing
                } else {
                    Value::Integer(a.value(idx))
                }
            }
            ChunkData::Codes(a) => {
                if a.is_null(idx) {
                    Value::Missing
                } else {
                    Value::Code(a.value(idx))
                }
            }
        }
    }

    /// Borrow the payload as a dynamically typed Arrow array.
    pub fn as_array(&self) -> &dyn Array {
        match self {
            ChunkData::Numeric(a) => a,
            ChunkData::Integer(a) => a,
            ChunkData::Codes(a) => a,
        }
    }
}
