// 목적:
// - 검색 조건을 조립하는 플루언트 빌더와 불변 검색 명세(QuerySpec)를 제공한다.
//
// 설명:
// - 빌더는 I/O를 하지 않는다. 같은 종류의 절을 다시 지정하면 이전 값을 덮어쓴다.
// - with_page만 즉시 검증하고, 나머지 절은 build()에서 한 번에 검증한다.
// - QuerySpec은 검색 호출 한 번에 소비(move)된다.
//
// 디자인 패턴:
// - 빌더(Builder) + 불변 값 객체(Immutable Value Object).
//
// 참조:
// - src_rs/query/request.rs
// - src_rs/index/store_client.rs

use serde::{Deserialize, Serialize};

use crate::core::errors::{CoreError, CoreResult};

/// 엔진이 page를 지정받지 못했을 때 쓰는 기본 크기.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: String,
    pub text: String,
}

/// 양 끝을 포함하는 범위 조건.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeClause {
    pub field: String,
    pub gte: Option<f64>,
    pub lte: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermsAggregation {
    pub name: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    match_clause: Option<MatchClause>,
    range: Option<RangeClause>,
    sort: Option<SortClause>,
    page: Option<Pagination>,
    aggregation: Option<TermsAggregation>,
    source_fields: Option<Vec<String>>,
}

impl QuerySpec {
    /// 조건이 하나도 없는 전체 조회.
    pub fn match_all() -> Self {
        Self {
            match_clause: None,
            range: None,
            sort: None,
            page: None,
            aggregation: None,
            source_fields: None,
        }
    }

    pub fn match_clause(&self) -> Option<&MatchClause> {
        self.match_clause.as_ref()
    }

    pub fn range(&self) -> Option<&RangeClause> {
        self.range.as_ref()
    }

    pub fn sort(&self) -> Option<&SortClause> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> Option<Pagination> {
        self.page
    }

    pub fn aggregation(&self) -> Option<&TermsAggregation> {
        self.aggregation.as_ref()
    }

    pub fn source_fields(&self) -> Option<&[String]> {
        self.source_fields.as_deref()
    }

    /// 총 페이지 수 계산에 쓰는 페이지 크기.
    pub fn effective_page_size(&self) -> u64 {
        self.page.map(|page| page.limit).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    match_clause: Option<MatchClause>,
    range: Option<RangeClause>,
    sort: Option<SortClause>,
    page: Option<Pagination>,
    aggregation: Option<TermsAggregation>,
    source_fields: Option<Vec<String>>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, field: &str, text: &str) -> Self {
        self.match_clause = Some(MatchClause {
            field: field.to_string(),
            text: text.to_string(),
        });
        self
    }

    pub fn with_range(mut self, field: &str, gte: Option<f64>, lte: Option<f64>) -> Self {
        self.range = Some(RangeClause {
            field: field.to_string(),
            gte,
            lte,
        });
        self
    }

    pub fn with_sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some(SortClause {
            field: field.to_string(),
            order,
        });
        self
    }

    pub fn with_page(mut self, offset: i64, limit: i64) -> CoreResult<Self> {
        if offset < 0 {
            return Err(CoreError::InvalidPagination(format!(
                "offset은 0 이상이어야 합니다: {}",
                offset
            )));
        }

        if limit <= 0 {
            return Err(CoreError::InvalidPagination(format!(
                "limit은 1 이상이어야 합니다: {}",
                limit
            )));
        }

        self.page = Some(Pagination {
            offset: offset as u64,
            limit: limit as u64,
        });
        Ok(self)
    }

    pub fn with_aggregation(mut self, name: &str, field: &str) -> Self {
        self.aggregation = Some(TermsAggregation {
            name: name.to_string(),
            field: field.to_string(),
        });
        self
    }

    pub fn with_source_filter(mut self, fields: &[&str]) -> Self {
        self.source_fields = Some(fields.iter().map(|field| field.to_string()).collect());
        self
    }

    pub fn build(self) -> CoreResult<QuerySpec> {
        if let Some(clause) = self.match_clause.as_ref() {
            require_field_name(&clause.field, "match")?;
            if clause.text.trim().is_empty() {
                return Err(CoreError::Validation(
                    "match 검색어는 비어 있을 수 없습니다".to_string(),
                ));
            }
        }

        if let Some(range) = self.range.as_ref() {
            require_field_name(&range.field, "range")?;
            validate_range(range)?;
        }

        if let Some(sort) = self.sort.as_ref() {
            require_field_name(&sort.field, "sort")?;
        }

        if let Some(aggregation) = self.aggregation.as_ref() {
            if aggregation.name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "aggregation 이름은 비어 있을 수 없습니다".to_string(),
                ));
            }
            require_field_name(&aggregation.field, "aggregation")?;
        }

        if let Some(fields) = self.source_fields.as_ref() {
            for field in fields {
                require_field_name(field, "source filter")?;
            }
        }

        Ok(QuerySpec {
            match_clause: self.match_clause,
            range: self.range,
            sort: self.sort,
            page: self.page,
            aggregation: self.aggregation,
            source_fields: self.source_fields,
        })
    }
}

fn require_field_name(field: &str, clause: &str) -> CoreResult<()> {
    if field.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "{} 절의 필드 이름은 비어 있을 수 없습니다",
            clause
        )));
    }
    Ok(())
}

fn validate_range(range: &RangeClause) -> CoreResult<()> {
    match (range.gte, range.lte) {
        (None, None) => Err(CoreError::Validation(format!(
            "range 절에는 최소 하나의 경계가 필요합니다: {}",
            range.field
        ))),
        (Some(gte), Some(lte)) if gte > lte => Err(CoreError::Validation(format!(
            "range 하한이 상한보다 큽니다: {} ({} > {})",
            range.field, gte, lte
        ))),
        (gte, lte) if gte.is_some_and(f64::is_nan) || lte.is_some_and(f64::is_nan) => Err(
            CoreError::Validation(format!("range 경계에 NaN을 쓸 수 없습니다: {}", range.field)),
        ),
        _ => Ok(()),
    }
}
