//! Oracle Spatial (SDO_GEOMETRY) text dumps.
//!
//! Rows exported with SQL*Loader control files carry geometries as
//! `(gtype; srid; (point); (elem_info...); (ordinates...))` with `;` separators,
//! decimal commas and empty trailing slots:
//!
//! ```text
//! (2002; 8307; (; ; ); (1; 2; 1; ; ; ); (7,74724; 45,09953; 7,74693; 45,09968; ; ; ))
//! ```

use super::LoadError;
use geo::{Coord, LineString};

/// 二维线串的 SDO_GTYPE
const GTYPE_LINE_2D: i64 = 2002;
/// SDO_ETYPE：线串
const ETYPE_LINE: i64 = 2;
/// 直线段连接的顶点
const INTERPRETATION_STRAIGHT: i64 = 1;

fn sdo_error(reason: impl Into<String>) -> LoadError {
    LoadError::Sdo {
        reason: reason.into(),
    }
}

/// 解析 SDO 文本为线串
pub fn parse_sdo_geometry(text: &str) -> Result<LineString<f64>, LoadError> {
    let body = strip_parens(text.trim())
        .ok_or_else(|| sdo_error("geometry must be enclosed in parentheses"))?;
    let fields = split_top_level(body)?;
    if fields.len() != 5 {
        return Err(sdo_error(format!(
            "expected 5 fields (gtype, srid, point, elem_info, ordinates), found {}",
            fields.len()
        )));
    }

    let gtype = parse_integer(fields[0])?.ok_or_else(|| sdo_error("missing gtype"))?;
    if gtype != GTYPE_LINE_2D {
        return Err(sdo_error(format!(
            "unsupported gtype {}, only 2-D line strings ({}) are supported",
            gtype, GTYPE_LINE_2D
        )));
    }

    check_elem_info(group_values(fields[3])?)?;

    let ordinates = group_values(fields[4])?
        .into_iter()
        .map(parse_ordinate)
        .collect::<Result<Vec<f64>, LoadError>>()?;

    if ordinates.len() % 2 != 0 {
        return Err(sdo_error(format!(
            "odd number of ordinates ({})",
            ordinates.len()
        )));
    }
    let coords: Vec<Coord<f64>> = ordinates
        .chunks_exact(2)
        .map(|pair| Coord {
            x: pair[0],
            y: pair[1],
        })
        .collect();
    if coords.len() < 2 {
        return Err(sdo_error(format!(
            "a line needs at least 2 points, found {}",
            coords.len()
        )));
    }

    Ok(LineString::new(coords))
}

fn strip_parens(text: &str) -> Option<&str> {
    text.strip_prefix('(')?.strip_suffix(')')
}

/// 按顶层分号切分，括号内的分号不切分
fn split_top_level(body: &str) -> Result<Vec<&str>, LoadError> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| sdo_error("unbalanced ')'"))?;
            }
            ';' if depth == 0 => {
                fields.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(sdo_error("unbalanced '('"));
    }
    fields.push(body[start..].trim());
    Ok(fields)
}

/// Non-empty slots of a parenthesized group, e.g. `(1; 2; 1; ; )` -> `["1", "2", "1"]`.
fn group_values(group: &str) -> Result<Vec<&str>, LoadError> {
    let inner = strip_parens(group)
        .ok_or_else(|| sdo_error(format!("expected a parenthesized group, found '{}'", group)))?;
    Ok(inner
        .split(';')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect())
}

fn parse_integer(value: &str) -> Result<Option<i64>, LoadError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| sdo_error(format!("expected an integer, found '{}'", value)))
}

/// 元素信息为 (偏移, 类型, 解释) 三元组，只支持单个直线段线串
fn check_elem_info(values: Vec<&str>) -> Result<(), LoadError> {
    if values.is_empty() {
        return Ok(());
    }
    if values.len() != 3 {
        return Err(sdo_error(format!(
            "expected one (offset, etype, interpretation) triplet, found {} values",
            values.len()
        )));
    }
    let etype = parse_integer(values[1])?;
    let interpretation = parse_integer(values[2])?;
    if etype != Some(ETYPE_LINE) || interpretation != Some(INTERPRETATION_STRAIGHT) {
        return Err(sdo_error(format!(
            "element ({}, {}) is not a straight-segment line string",
            values[1], values[2]
        )));
    }
    Ok(())
}

/// 小数逗号转为小数点
fn parse_ordinate(value: &str) -> Result<f64, LoadError> {
    let ordinate = value
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| sdo_error(format!("bad ordinate '{}'", value)))?;
    if !ordinate.is_finite() {
        return Err(LoadError::InvalidCoordinate {
            reason: format!("ordinate '{}' is not finite", value),
        });
    }
    Ok(ordinate)
}
