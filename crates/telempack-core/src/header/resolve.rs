use super::error::HeaderError;
use super::parser::Dialect;
use super::tree::Element;

/// How sizing defects in a dataset definition are reported.
///
/// The framer resolves in `Advisory` mode, where a definition that cannot be
/// sized yields "indeterminate" instead of failing the stream. `Strict` mode
/// is for validators, which want the defect surfaced with its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Advisory,
}

/// Compute the fixed byte length of the data records a dataset definition
/// describes, or `Ok(None)` when the length is indeterminate (a
/// variable-length array dimension, or -- in advisory mode -- a sizing
/// defect).
///
/// The legacy algorithm sums per-child value widths taken from the trailing
/// digits of each `type` attribute, times `nitems` for array-valued yscan
/// children. The current-generation algorithm prefers the dataset's `size`
/// attribute, then per-axis sizes, then recurses into the per-array packet
/// descriptors and sums `numItems * itemBytes`.
pub fn record_length(
    root: &Element,
    dialect: Dialect,
    strictness: Strictness,
) -> Result<Option<usize>, HeaderError> {
    match dialect {
        Dialect::Legacy => legacy_record_length(root, strictness),
        Dialect::Current => current_record_length(root, strictness),
    }
}

fn legacy_record_length(
    root: &Element,
    strictness: Strictness,
) -> Result<Option<usize>, HeaderError> {
    let mut total = 0usize;

    // The legacy dialect allows no extra elements inside a dataset
    // definition, so every direct child must carry a sized type.
    for child in &root.children {
        let Some(type_name) = child.attr("type") else {
            return sizing_defect(strictness, HeaderError::MissingAttribute {
                element: child.name.clone(),
                attr: "type",
                line: child.line,
            });
        };
        let Some(width) = value_width(type_name) else {
            return sizing_defect(strictness, HeaderError::InvalidAttribute {
                element: child.name.clone(),
                attr: "type",
                value: type_name.to_string(),
                line: child.line,
            });
        };

        let mut items = 1usize;
        let mut items_raw = None;
        if child.local_name() == "yscan" {
            if let Some(raw) = child.attr("nitems") {
                match raw.trim().parse::<usize>() {
                    Ok(n) if n >= 1 => {
                        items = n;
                        items_raw = Some(raw);
                    }
                    _ => {
                        return sizing_defect(strictness, HeaderError::InvalidAttribute {
                            element: child.name.clone(),
                            attr: "nitems",
                            value: raw.to_string(),
                            line: child.line,
                        });
                    }
                }
            }
        }

        // A product or sum that exceeds usize cannot describe a real record;
        // it is a sizing defect, not a panic.
        let Some(sized) = width
            .checked_mul(items)
            .and_then(|bytes| total.checked_add(bytes))
        else {
            let (attr, value) = match items_raw {
                Some(raw) => ("nitems", raw.to_string()),
                None => ("type", type_name.to_string()),
            };
            return sizing_defect(strictness, HeaderError::InvalidAttribute {
                element: child.name.clone(),
                attr,
                value,
                line: child.line,
            });
        };
        total = sized;
    }

    Ok(Some(total))
}

fn current_record_length(
    root: &Element,
    strictness: Strictness,
) -> Result<Option<usize>, HeaderError> {
    // A '*' in any non-leading field of the record shape means the records
    // are variable length, which is legal here, never a defect.
    if let Some(size) = root.attr("size") {
        let fields: Vec<&str> = size.split(';').collect();
        if fields.len() > 1 && fields[1..].iter().any(|f| f.trim() == "*") {
            return Ok(None);
        }
    } else {
        for axis_size in ["jSize", "kSize"] {
            let Some(raw) = root.attr(axis_size) else {
                continue;
            };
            let raw = raw.trim();
            if raw == "*" {
                return Ok(None);
            }
            if !raw.is_empty() && raw.parse::<usize>().is_err() {
                return Ok(None);
            }
        }
    }

    let mut total = 0usize;
    for axis in &root.children {
        if matches!(axis.local_name(), "extension" | "properties") {
            continue;
        }
        for array in &axis.children {
            if !matches!(array.local_name(), "scalar" | "vector" | "object") {
                continue;
            }
            for descriptor in &array.children {
                if descriptor.local_name() != "packet" {
                    continue;
                }
                let Some(items) = descriptor_field(descriptor, "numItems", strictness)? else {
                    return Ok(None);
                };
                let Some(bytes) = descriptor_field(descriptor, "itemBytes", strictness)? else {
                    return Ok(None);
                };
                let Some(sized) = items
                    .checked_mul(bytes)
                    .and_then(|product| total.checked_add(product))
                else {
                    return sizing_defect(strictness, HeaderError::InvalidAttribute {
                        element: descriptor.name.clone(),
                        attr: "numItems",
                        value: items.to_string(),
                        line: descriptor.line,
                    });
                };
                total = sized;
            }
        }
    }

    Ok(Some(total))
}

/// Read a positive-integer sizing attribute from a packet descriptor.
/// Missing, `*`, or non-positive values are indeterminate in advisory mode
/// and hard errors in strict mode.
fn descriptor_field(
    descriptor: &Element,
    attr: &'static str,
    strictness: Strictness,
) -> Result<Option<usize>, HeaderError> {
    let Some(raw) = descriptor.attr(attr) else {
        return sizing_defect(strictness, HeaderError::MissingAttribute {
            element: descriptor.name.clone(),
            attr,
            line: descriptor.line,
        });
    };

    let trimmed = raw.trim();
    if trimmed != "*" {
        if let Ok(n) = trimmed.parse::<usize>() {
            if n >= 1 {
                return Ok(Some(n));
            }
        }
    }

    sizing_defect(strictness, HeaderError::InvalidAttribute {
        element: descriptor.name.clone(),
        attr,
        value: raw.to_string(),
        line: descriptor.line,
    })
}

fn sizing_defect(
    strictness: Strictness,
    error: HeaderError,
) -> Result<Option<usize>, HeaderError> {
    match strictness {
        Strictness::Strict => Err(error),
        Strictness::Advisory => Ok(None),
    }
}

/// Legacy type names end in their byte width; count digits backwards from
/// the end of the name.
fn value_width(type_name: &str) -> Option<usize> {
    let split = type_name.trim_end().trim_end_matches(|c: char| c.is_ascii_digit());
    let trailing = &type_name.trim_end()[split.len()..];
    if trailing.is_empty() {
        None
    } else {
        trailing.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Strictness, record_length, value_width};
    use crate::header::error::HeaderError;
    use crate::header::parser::{Dialect, parse_header};

    fn legacy(xml: &str, strictness: Strictness) -> Result<Option<usize>, HeaderError> {
        let root = parse_header(xml, Dialect::Legacy).unwrap();
        record_length(&root, Dialect::Legacy, strictness)
    }

    fn current(xml: &str, strictness: Strictness) -> Result<Option<usize>, HeaderError> {
        let root = parse_header(xml, Dialect::Current).unwrap();
        record_length(&root, Dialect::Current, strictness)
    }

    #[test]
    fn value_width_takes_trailing_digits() {
        assert_eq!(value_width("little_endian_real4"), Some(4));
        assert_eq!(value_width("time24"), Some(24));
        assert_eq!(value_width("ascii"), None);
    }

    #[test]
    fn legacy_sums_child_widths() {
        let len = legacy(
            "<packet><x type=\"time24\"/><y type=\"sun_real4\"/></packet>",
            Strictness::Strict,
        )
        .unwrap();
        assert_eq!(len, Some(28));
    }

    #[test]
    fn legacy_yscan_multiplies_by_nitems() {
        let len = legacy(
            "<packet><x type=\"time24\"/><yscan type=\"ascii11\" nitems=\"6\"/></packet>",
            Strictness::Strict,
        )
        .unwrap();
        assert_eq!(len, Some(24 + 11 * 6));
    }

    #[test]
    fn legacy_nitems_only_applies_to_yscan() {
        let len = legacy(
            "<packet><y type=\"sun_real4\" nitems=\"6\"/></packet>",
            Strictness::Strict,
        )
        .unwrap();
        assert_eq!(len, Some(4));
    }

    #[test]
    fn legacy_missing_type_is_mode_dependent() {
        let xml = "<packet><x type=\"time24\"/><y units=\"V\"/></packet>";
        assert_eq!(legacy(xml, Strictness::Advisory).unwrap(), None);
        let err = legacy(xml, Strictness::Strict).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::MissingAttribute { attr: "type", .. }
        ));
    }

    #[test]
    fn legacy_unsized_type_is_mode_dependent() {
        let xml = "<packet><x type=\"ascii\"/></packet>";
        assert_eq!(legacy(xml, Strictness::Advisory).unwrap(), None);
        assert!(legacy(xml, Strictness::Strict).is_err());
    }

    #[test]
    fn legacy_oversized_nitems_is_a_sizing_defect() {
        let xml = "<packet><yscan type=\"ascii8\" nitems=\"9999999999999999999\"/></packet>";
        assert_eq!(legacy(xml, Strictness::Advisory).unwrap(), None);
        let err = legacy(xml, Strictness::Strict).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::InvalidAttribute { attr: "nitems", .. }
        ));
    }

    #[test]
    fn current_sums_packet_descriptors() {
        let xml = "<dataset rank=\"2\">\
           <coord><scalar><packet numItems=\"1\" itemBytes=\"8\"/></scalar></coord>\
           <data><vector><packet numItems=\"3\" itemBytes=\"4\"/></vector></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Strict).unwrap(), Some(20));
    }

    #[test]
    fn current_star_in_trailing_size_field_is_indeterminate() {
        let xml = "<dataset size=\"20;*\">\
           <data><scalar><packet numItems=\"1\" itemBytes=\"4\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Strict).unwrap(), None);
    }

    #[test]
    fn current_leading_size_field_star_does_not_force_indeterminate() {
        let xml = "<dataset size=\"*\">\
           <data><scalar><packet numItems=\"2\" itemBytes=\"4\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Strict).unwrap(), Some(8));
    }

    #[test]
    fn current_star_axis_size_is_indeterminate() {
        let xml = "<dataset jSize=\"*\">\
           <data><scalar><packet numItems=\"2\" itemBytes=\"4\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Advisory).unwrap(), None);
    }

    #[test]
    fn current_skips_extension_and_properties() {
        let xml = "<dataset>\
           <properties><p name=\"title\">x</p></properties>\
           <extension><scalar><packet numItems=\"9\" itemBytes=\"9\"/></scalar></extension>\
           <data><scalar><packet numItems=\"1\" itemBytes=\"4\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Strict).unwrap(), Some(4));
    }

    #[test]
    fn current_star_num_items_is_mode_dependent() {
        let xml = "<dataset>\
           <data><scalar><packet numItems=\"*\" itemBytes=\"4\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Advisory).unwrap(), None);
        let err = current(xml, Strictness::Strict).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::InvalidAttribute {
                attr: "numItems",
                ..
            }
        ));
    }

    #[test]
    fn current_descriptor_product_overflow_is_a_sizing_defect() {
        let xml = "<dataset>\
           <data><scalar><packet numItems=\"99999999999\" itemBytes=\"99999999999\"/></scalar></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Advisory).unwrap(), None);
        let err = current(xml, Strictness::Strict).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::InvalidAttribute {
                attr: "numItems",
                ..
            }
        ));
    }

    #[test]
    fn current_missing_item_bytes_is_mode_dependent() {
        let xml = "<dataset>\
           <data><object><packet numItems=\"2\"/></object></data>\
         </dataset>";
        assert_eq!(current(xml, Strictness::Advisory).unwrap(), None);
        assert!(current(xml, Strictness::Strict).is_err());
    }
}
