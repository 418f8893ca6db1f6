//! Small helpers over `quick-xml` events shared by the GIFTI and CIFTI-2 readers.

use crate::error::Result;
use quick_xml::events::{BytesCData, BytesStart, BytesText};
use std::collections::HashMap;

/// The (possibly namespaced) name of a start tag, as a string.
pub fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Collect all attributes of a start tag, unescaped.
pub fn attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        let _ = map.insert(key, value);
    }
    Ok(map)
}

/// Unescaped character data of a text event.
pub fn text(t: &BytesText) -> Result<String> {
    Ok(t.unescape().map_err(quick_xml::Error::from)?.into_owned())
}

/// Raw character data of a CDATA section.
pub fn cdata(c: BytesCData) -> String {
    String::from_utf8_lossy(&c.into_inner()).into_owned()
}
