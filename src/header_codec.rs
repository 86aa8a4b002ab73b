/*
 * Parses and emits the textual C-header model format of SPEC_FULL.md §6.
 * This format exists purely for compatibility with the reference Python
 * model generator's dumps; nothing here feeds the codec directly except by
 * round-tripping through a Model.
 */

use crate::model::{Model, ModelError, INVALID};
use crate::pack_scheme::{PackScheme, MAX_BYTES_UNPACKED};

/// Renders `model` as a C header text, matching SPEC_FULL.md §6.
pub fn write_header(model: &Model) -> String {
    let mut out = String::new();
    out.push_str(&format!("#define MIN_CHR {}\n", model.min_char as i32));
    out.push_str(&format!("#define MAX_CHR {}\n", model.max_char as i32));

    out.push_str(&format!(
        "static const char chrs_by_chr_id[{}] = {{ {} }};\n",
        model.chars_by_id.len(),
        model
            .chars_by_id
            .iter()
            .map(|&b| char_literal(b))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    out.push_str(&format!(
        "static const int8_t chr_ids_by_chr[256] = {{ {} }};\n",
        model
            .ids_by_char
            .iter()
            .map(|&id| int8_literal(id))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let n = model.leading_count;
    let rows: Vec<String> = (0..n)
        .map(|r| {
            let row: Vec<String> = (0..n)
                .map(|c| int8_literal(model.successor_id(r as u8, c as u8)))
                .collect();
            format!("{{ {} }}", row.join(", "))
        })
        .collect();
    out.push_str(&format!(
        "static const int8_t successor_ids_by_chr_id_and_chr_id[{n}][{n}] = {{ {} }};\n",
        rows.join(", ")
    ));

    let row_count = model.max_char as usize - model.min_char as usize;
    let s = model.successor_count;
    let rows: Vec<String> = (0..row_count)
        .map(|r| {
            let byte = model.min_char.wrapping_add(r as u8);
            let row: Vec<String> = (0..s as u8)
                .map(|rank| {
                    model
                        .char_by_successor_id(byte, rank)
                        .map(char_literal)
                        .unwrap_or_else(|| char_literal(INVALID))
                })
                .collect();
            format!("{{ {} }}", row.join(", "))
        })
        .collect();
    out.push_str(&format!(
        "static const int8_t chrs_by_chr_and_successor_id[{row_count}][{s}] = {{ {} }};\n",
        rows.join(", ")
    ));

    out.push_str(&format!("#define PACK_COUNT {}\n", model.packs.len()));
    out.push_str("#define MAX_SUCCESSOR_N 7\n");

    let pack_rows: Vec<String> = model.packs.iter().map(pack_literal).collect();
    out.push_str(&format!(
        "static const Pack packs[{}] = {{\n  {}\n}};\n",
        model.packs.len(),
        pack_rows.join(",\n  ")
    ));

    out
}

fn pack_literal(p: &PackScheme) -> String {
    let mut offsets = p.offsets.clone();
    let mut masks = p.masks.clone();
    offsets.resize(MAX_BYTES_UNPACKED, 0);
    masks.resize(MAX_BYTES_UNPACKED, 0);
    format!(
        "{{ 0x{:08X}, {}, {}, {{ {} }}, {{ {} }}, 0x{:02X}, 0x{:02X} }}",
        (p.header as u32) << 24,
        p.bytes_packed,
        p.bytes_unpacked,
        offsets.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", "),
        masks.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", "),
        p.header,
        p.header_mask,
    )
}

fn char_literal(b: u8) -> String {
    match b {
        b'\\' => "'\\\\'".to_string(),
        b'\'' => "'\\''".to_string(),
        0x07 => "'\\a'".to_string(),
        0x08 => "'\\b'".to_string(),
        0x0C => "'\\f'".to_string(),
        0x0A => "'\\n'".to_string(),
        0x0D => "'\\r'".to_string(),
        0x09 => "'\\t'".to_string(),
        0x0B => "'\\v'".to_string(),
        0x1B => "'\\e'".to_string(),
        0x20..=0x7E => format!("'{}'", b as char),
        _ => format!("'\\x{b:02x}'"),
    }
}

fn int8_literal(value: u8) -> String {
    if value == INVALID {
        "-1".to_string()
    } else {
        value.to_string()
    }
}

/// Parses a model previously emitted by `write_header`. Tolerant of the C
/// escapes named in SPEC_FULL.md §6 and of `-1` standing in for `INVALID`.
pub fn parse_header(text: &str) -> Result<Model, ModelError> {
    let min_char = parse_define_i32(text, "MIN_CHR")? as u8;
    let max_char = parse_define_i32(text, "MAX_CHR")? as u8;

    let chars_by_id = parse_char_array(text, "chrs_by_chr_id")?;
    let ids_by_char_vec = parse_int_array(text, "chr_ids_by_chr")?;
    if ids_by_char_vec.len() != 256 {
        return Err(ModelError::HeaderParseError(format!(
            "chr_ids_by_chr must have 256 entries, got {}",
            ids_by_char_vec.len()
        )));
    }
    let mut ids_by_char = [INVALID; 256];
    ids_by_char.copy_from_slice(&ids_by_char_vec);

    let leading_count = chars_by_id.len();
    let successor_ids = parse_nested_int_array(text, "successor_ids_by_chr_id_and_chr_id")?;
    if successor_ids.len() != leading_count * leading_count {
        return Err(ModelError::HeaderParseError(
            "successor_ids_by_chr_id_and_chr_id shape mismatch".into(),
        ));
    }

    let chars_by_successor_rows = parse_nested_char_array(text, "chrs_by_chr_and_successor_id")?;
    let rows = max_char as usize - min_char as usize;
    let s = if rows > 0 { chars_by_successor_rows.len() / rows } else { 0 };
    if rows * s != chars_by_successor_rows.len() {
        return Err(ModelError::HeaderParseError(
            "chrs_by_chr_and_successor_id shape mismatch".into(),
        ));
    }

    let pack_count = parse_define_i32(text, "PACK_COUNT")? as usize;
    let packs = parse_packs(text, pack_count)?;

    Model::new(
        min_char,
        max_char,
        chars_by_id,
        ids_by_char,
        successor_ids,
        chars_by_successor_rows,
        s,
        packs,
    )
}

fn parse_define_i32(text: &str, name: &str) -> Result<i32, ModelError> {
    let needle = format!("#define {name} ");
    let line = text
        .lines()
        .find(|l| l.starts_with(&needle))
        .ok_or_else(|| ModelError::HeaderParseError(format!("missing #define {name}")))?;
    line[needle.len()..]
        .trim()
        .parse::<i32>()
        .map_err(|e| ModelError::HeaderParseError(format!("bad value for {name}: {e}")))
}

/// Extracts the `{ ... }` braced body following `needle` up to its matching
/// close brace, scanning for balanced braces so nested arrays work too.
fn extract_braced_body<'a>(text: &'a str, needle: &str) -> Result<&'a str, ModelError> {
    let start = text
        .find(needle)
        .ok_or_else(|| ModelError::HeaderParseError(format!("missing declaration for {needle}")))?;
    let rest = &text[start..];
    let open = rest
        .find('{')
        .ok_or_else(|| ModelError::HeaderParseError(format!("missing '{{' after {needle}")))?;
    let mut depth = 0i32;
    let bytes = rest.as_bytes();
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| ModelError::HeaderParseError(format!("unbalanced braces for {needle}")))?;
    Ok(&rest[open + 1..end])
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let bytes = body.as_bytes();
    let mut in_char_literal = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !in_char_literal => in_char_literal = true,
            b'\'' if in_char_literal => {
                // Account for an escaped quote like '\''.
                if i >= 2 && bytes[i - 1] == b'\'' && bytes[i - 2] == b'\\' {
                    // closing quote of '\''
                }
                in_char_literal = false;
            }
            b'{' if !in_char_literal => depth += 1,
            b'}' if !in_char_literal => depth -= 1,
            b',' if depth == 0 && !in_char_literal => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn parse_int_array(text: &str, name: &str) -> Result<Vec<u8>, ModelError> {
    let body = extract_braced_body(text, name)?;
    split_top_level(body)
        .into_iter()
        .map(parse_int8)
        .collect()
}

fn parse_nested_int_array(text: &str, name: &str) -> Result<Vec<u8>, ModelError> {
    let body = extract_braced_body(text, name)?;
    let mut flat = Vec::new();
    for row in split_top_level(body) {
        let row_body = row
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .ok_or_else(|| ModelError::HeaderParseError(format!("expected braced row in {name}")))?;
        for v in split_top_level(row_body) {
            flat.push(parse_int8(v)?);
        }
    }
    Ok(flat)
}

fn parse_char_array(text: &str, name: &str) -> Result<Vec<u8>, ModelError> {
    let body = extract_braced_body(text, name)?;
    split_top_level(body).into_iter().map(parse_char_literal).collect()
}

fn parse_nested_char_array(text: &str, name: &str) -> Result<Vec<u8>, ModelError> {
    let body = extract_braced_body(text, name)?;
    let mut flat = Vec::new();
    for row in split_top_level(body) {
        let row_body = row
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .ok_or_else(|| ModelError::HeaderParseError(format!("expected braced row in {name}")))?;
        for v in split_top_level(row_body) {
            flat.push(parse_char_literal(v)?);
        }
    }
    Ok(flat)
}

fn parse_int8(token: &str) -> Result<u8, ModelError> {
    let token = token.trim();
    if token == "-1" {
        return Ok(INVALID);
    }
    token
        .parse::<i32>()
        .map(|v| v as u8)
        .map_err(|e| ModelError::HeaderParseError(format!("bad int8 literal '{token}': {e}")))
}

fn parse_char_literal(token: &str) -> Result<u8, ModelError> {
    let token = token.trim();
    let inner = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .ok_or_else(|| ModelError::HeaderParseError(format!("expected char literal, got '{token}'")))?;

    if inner == "-1" {
        return Ok(INVALID);
    }

    let bytes = inner.as_bytes();
    if bytes.is_empty() {
        return Err(ModelError::HeaderParseError("empty char literal".into()));
    }
    if bytes[0] != b'\\' {
        return Ok(bytes[0]);
    }
    match bytes.get(1) {
        Some(b'a') => Ok(0x07),
        Some(b'b') => Ok(0x08),
        Some(b'f') => Ok(0x0C),
        Some(b'n') => Ok(0x0A),
        Some(b'r') => Ok(0x0D),
        Some(b't') => Ok(0x09),
        Some(b'v') => Ok(0x0B),
        Some(b'e') => Ok(0x1B),
        Some(b'\\') => Ok(b'\\'),
        Some(b'\'') => Ok(b'\''),
        Some(b'"') => Ok(b'"'),
        Some(b'?') => Ok(b'?'),
        Some(b'x') => {
            let hex = &inner[2..];
            u8::from_str_radix(hex, 16)
                .map_err(|e| ModelError::HeaderParseError(format!("bad hex escape '{inner}': {e}")))
        }
        Some(d) if d.is_ascii_digit() => {
            let octal = &inner[1..];
            u8::from_str_radix(octal, 8)
                .map_err(|e| ModelError::HeaderParseError(format!("bad octal escape '{inner}': {e}")))
        }
        _ => Err(ModelError::HeaderParseError(format!(
            "unrecognized escape in char literal '{token}'"
        ))),
    }
}

fn parse_packs(text: &str, count: usize) -> Result<Vec<PackScheme>, ModelError> {
    let body = extract_braced_body(text, "static const Pack packs")?;
    let rows = split_top_level(body);
    if rows.len() != count {
        return Err(ModelError::HeaderParseError(format!(
            "PACK_COUNT said {count} but found {} pack entries",
            rows.len()
        )));
    }
    rows.into_iter().map(parse_one_pack).collect()
}

fn parse_one_pack(row: &str) -> Result<PackScheme, ModelError> {
    let row_body = row
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .ok_or_else(|| ModelError::HeaderParseError(format!("expected braced pack entry, got '{row}'")))?;
    let fields = split_top_level(row_body);
    if fields.len() != 7 {
        return Err(ModelError::HeaderParseError(format!(
            "expected 7 fields in a pack entry, got {}",
            fields.len()
        )));
    }
    let bytes_packed: u8 = parse_c_int(fields[1])?;
    let bytes_unpacked: u8 = parse_c_int(fields[2])?;

    let offsets_body = fields[3]
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .ok_or_else(|| ModelError::HeaderParseError("expected braced offsets array".into()))?;
    let masks_body = fields[4]
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .ok_or_else(|| ModelError::HeaderParseError("expected braced masks array".into()))?;

    let mut offsets: Vec<u32> = split_top_level(offsets_body)
        .into_iter()
        .map(parse_c_int)
        .collect::<Result<_, _>>()?;
    let mut masks: Vec<u32> = split_top_level(masks_body)
        .into_iter()
        .map(parse_c_int)
        .collect::<Result<_, _>>()?;
    offsets.truncate(bytes_unpacked as usize);
    masks.truncate(bytes_unpacked as usize);

    let header: u8 = parse_c_int(fields[5])?;
    let header_mask: u8 = parse_c_int(fields[6])?;

    Ok(PackScheme {
        header,
        header_mask,
        bytes_packed,
        bytes_unpacked,
        offsets,
        masks,
    })
}

fn parse_c_int<T>(token: &str) -> Result<T, ModelError>
where
    T: TryFrom<u64>,
{
    let token = token.trim();
    let value = if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| ModelError::HeaderParseError(format!("bad hex literal '{token}': {e}")))?
    } else {
        token
            .parse::<u64>()
            .map_err(|e| ModelError::HeaderParseError(format!("bad integer literal '{token}': {e}")))?
    };
    T::try_from(value).map_err(|_| ModelError::HeaderParseError(format!("literal '{token}' out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_model::default_model;

    #[test]
    fn char_literal_round_trips_printable_ascii() {
        assert_eq!(parse_char_literal(&char_literal(b'a')).unwrap(), b'a');
        assert_eq!(parse_char_literal(&char_literal(b' ')).unwrap(), b' ');
    }

    #[test]
    fn char_literal_round_trips_escapes() {
        for b in [0x00u16, 0x07, 0x0A, 0x0D, 0x1B, 0x7F, 0x80, 0xFF] {
            let b = b as u8;
            assert_eq!(parse_char_literal(&char_literal(b)).unwrap(), b);
        }
    }

    #[test]
    fn int8_literal_round_trips_invalid_sentinel() {
        assert_eq!(parse_int8(&int8_literal(INVALID)).unwrap(), INVALID);
        assert_eq!(parse_int8(&int8_literal(5)).unwrap(), 5);
    }

    #[test]
    fn header_round_trips_the_default_model() {
        let model = default_model();
        let text = write_header(&model);
        let parsed = parse_header(&text).unwrap();
        assert_eq!(parsed, model);
    }
}
