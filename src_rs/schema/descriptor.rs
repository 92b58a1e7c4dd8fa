// 목적:
// - 문서 타입의 필드/타입/색인 방식을 선언하는 스키마 디스크립터를 제공한다.
//
// 설명:
// - 필드 선언은 타입 이름 문자열에서 파싱되며, 알 수 없는 타입은 InvalidFieldType으로 거부한다.
// - 디스크립터는 인덱스 생성(settings)과 매핑 적용(properties) 페이로드를 순수하게 만들어낸다.
// - 한 번 생성되면 읽기 전용이다.
//
// 디자인 패턴:
// - 명시적 스키마 팩토리(Explicit Schema Factory).
//
// 참조:
// - src_rs/schema/item.rs
// - src_rs/index/store_client.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::core::errors::{CoreError, CoreResult};

/// 엔진이 이해하는 필드 타입이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::HalfFloat => "half_float",
            FieldType::ScaledFloat => "scaled_float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Long
                | FieldType::Integer
                | FieldType::Short
                | FieldType::Byte
                | FieldType::Double
                | FieldType::Float
                | FieldType::HalfFloat
                | FieldType::ScaledFloat
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let parsed = match normalized.as_str() {
            "text" => FieldType::Text,
            "keyword" => FieldType::Keyword,
            "long" => FieldType::Long,
            "integer" => FieldType::Integer,
            "short" => FieldType::Short,
            "byte" => FieldType::Byte,
            "double" => FieldType::Double,
            "float" => FieldType::Float,
            "half_float" => FieldType::HalfFloat,
            "scaled_float" => FieldType::ScaledFloat,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            _ => return Err(CoreError::InvalidFieldType(raw.to_string())),
        };
        Ok(parsed)
    }
}

/// 필드가 엔진에서 어떻게 색인되는지 나타낸다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingMode {
    AnalyzedText,
    Keyword,
    Numeric,
    StoredOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    indexed: bool,
    analyzer: Option<String>,
}

impl FieldDescriptor {
    /// 타입 이름 문자열로 필드를 선언한다.
    pub fn declare(name: &str, type_name: &str) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "필드 이름은 비어 있을 수 없습니다".to_string(),
            ));
        }

        let field_type = type_name.parse::<FieldType>()?;
        Ok(Self {
            name: name.to_string(),
            field_type,
            indexed: true,
            analyzer: None,
        })
    }

    /// 색인하지 않고 `_source`에만 보관한다.
    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    pub fn with_analyzer(mut self, analyzer: &str) -> Self {
        self.analyzer = Some(analyzer.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn analyzer(&self) -> Option<&str> {
        self.analyzer.as_deref()
    }

    pub fn indexing_mode(&self) -> IndexingMode {
        if !self.indexed {
            return IndexingMode::StoredOnly;
        }

        match self.field_type {
            FieldType::Text => IndexingMode::AnalyzedText,
            field_type if field_type.is_numeric() => IndexingMode::Numeric,
            _ => IndexingMode::Keyword,
        }
    }

    /// `properties` 아래에 들어갈 단일 필드 매핑.
    pub fn mapping_entry(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("type".to_string(), json!(self.field_type.as_str()));
        if let Some(analyzer) = self.analyzer.as_ref() {
            entry.insert("analyzer".to_string(), json!(analyzer));
        }
        if !self.indexed {
            entry.insert("index".to_string(), json!(false));
        }
        Value::Object(entry)
    }

    /// 엔진에 이미 존재하는 매핑과 비교한다. 타입/색인 여부/분석기가 다르면 충돌이다.
    fn check_compatible(&self, existing: &Value) -> CoreResult<()> {
        let existing_type = existing.get("type").and_then(Value::as_str).unwrap_or("object");
        if existing_type != self.field_type.as_str() {
            return Err(CoreError::MappingConflict(format!(
                "필드 [{}]의 타입을 {}에서 {}(으)로 바꿀 수 없습니다",
                self.name, existing_type, self.field_type
            )));
        }

        let existing_indexed = existing.get("index").and_then(Value::as_bool).unwrap_or(true);
        if existing_indexed != self.indexed {
            return Err(CoreError::MappingConflict(format!(
                "필드 [{}]의 index 설정을 {}에서 {}(으)로 바꿀 수 없습니다",
                self.name, existing_indexed, self.indexed
            )));
        }

        let existing_analyzer = existing.get("analyzer").and_then(Value::as_str);
        if existing_analyzer != self.analyzer.as_deref() {
            return Err(CoreError::MappingConflict(format!(
                "필드 [{}]의 analyzer를 {:?}에서 {:?}(으)로 바꿀 수 없습니다",
                self.name, existing_analyzer, self.analyzer
            )));
        }

        Ok(())
    }
}

/// 문서 타입 하나의 인덱스 스키마다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    index_name: String,
    type_name: String,
    shards: u32,
    replicas: u32,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(
        index_name: &str,
        type_name: &str,
        shards: u32,
        replicas: u32,
        fields: Vec<FieldDescriptor>,
    ) -> CoreResult<Self> {
        validate_index_name(index_name)?;

        if shards == 0 {
            return Err(CoreError::Validation(
                "shard 수는 1 이상이어야 합니다".to_string(),
            ));
        }

        if fields.is_empty() {
            return Err(CoreError::Validation(format!(
                "인덱스 {}에 필드가 하나도 없습니다",
                index_name
            )));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "필드 이름이 중복되었습니다: {}",
                    field.name
                )));
            }

            if field.analyzer.is_some() && field.field_type != FieldType::Text {
                return Err(CoreError::Validation(format!(
                    "analyzer는 text 필드에만 지정할 수 있습니다: {} ({})",
                    field.name, field.field_type
                )));
            }
        }

        Ok(Self {
            index_name: index_name.to_string(),
            type_name: type_name.to_string(),
            shards,
            replicas,
            fields,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn shards(&self) -> u32 {
        self.shards
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// 인덱스 생성 요청 본문.
    pub fn settings_payload(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas,
            }
        })
    }

    /// 매핑 적용 요청 본문.
    pub fn mapping_payload(&self) -> Value {
        let properties = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.mapping_entry()))
            .collect::<Map<_, _>>();

        json!({ "properties": properties })
    }

    /// 엔진에 아직 없는 필드 이름을 돌려준다. 이미 있는 필드가 다르게 정의되어 있으면 MappingConflict.
    pub fn pending_fields(
        &self,
        existing_properties: &Map<String, Value>,
    ) -> CoreResult<Vec<&str>> {
        let mut pending = Vec::new();
        for field in &self.fields {
            match existing_properties.get(&field.name) {
                Some(existing) => field.check_compatible(existing)?,
                None => pending.push(field.name.as_str()),
            }
        }
        Ok(pending)
    }
}

/// 엔진 인덱스 이름 규칙을 검사한다. `_all`, 와일드카드, 경로 문자는 여기서 걸러진다.
pub(crate) fn validate_index_name(index_name: &str) -> CoreResult<()> {
    if index_name.is_empty() {
        return Err(CoreError::Validation(
            "인덱스 이름은 비어 있을 수 없습니다".to_string(),
        ));
    }

    if index_name == "." || index_name == ".." {
        return Err(CoreError::Validation(format!(
            "인덱스 이름으로 쓸 수 없습니다: {}",
            index_name
        )));
    }

    if index_name.starts_with(['-', '_', '+']) {
        return Err(CoreError::Validation(format!(
            "인덱스 이름은 -, _, +로 시작할 수 없습니다: {}",
            index_name
        )));
    }

    let valid = index_name.chars().all(|ch| {
        !ch.is_ascii_uppercase()
            && !ch.is_whitespace()
            && !matches!(ch, '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ',' | '#')
    });

    if !valid {
        return Err(CoreError::Validation(format!(
            "인덱스 이름에 대문자/공백/특수문자를 쓸 수 없습니다: {}",
            index_name
        )));
    }

    Ok(())
}
