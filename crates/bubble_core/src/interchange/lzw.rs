//! Reader for the dictionary compression the structured editor applies to
//! its saved payload. Only decompression is needed: payloads are always
//! written back uncompressed.

use std::collections::HashMap;

use crate::error::{Error, Result};

const FIRST_CODE: u32 = 256;

/// Expands a compressed payload given as UTF-16 code units, each either a
/// literal (below 256) or a dictionary code. Codes may fall in the surrogate
/// range once the dictionary is large enough. A code not yet in the
/// dictionary is the one being defined by this very step: the previous
/// phrase followed by its own first unit.
pub fn decompress(codes: &[u16]) -> Result<String> {
    let Some((&first, rest)) = codes.split_first() else {
        return Ok(String::new());
    };

    let mut dict: HashMap<u32, Vec<u16>> = HashMap::new();
    let mut next_code = FIRST_CODE;
    let mut current_unit = first;
    let mut previous = vec![first];
    let mut out = vec![first];

    for &code in rest {
        let phrase = if u32::from(code) < FIRST_CODE {
            vec![code]
        } else if let Some(known) = dict.get(&u32::from(code)) {
            known.clone()
        } else {
            let mut phrase = previous.clone();
            phrase.push(current_unit);
            phrase
        };

        out.extend_from_slice(&phrase);
        current_unit = phrase[0];

        let mut entry = previous;
        entry.push(current_unit);
        dict.insert(next_code, entry);
        next_code += 1;
        previous = phrase;
    }

    String::from_utf16(&out)
        .map_err(|e| Error::malformed(format!("decompressed payload is not valid UTF-16: {e}")))
}
