use anyhow::{Context, Result, anyhow};

use super::{perm::Perm4, triangulation::Triangulation};

const FACETS: usize = 4;
const CHARS_PER_PERM: usize = 1;

fn decode_single(c: u8) -> Option<usize> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as usize),
        b'A'..=b'Z' => Some((c - b'A') as usize + 26),
        b'0'..=b'9' => Some((c - b'0') as usize + 52),
        b'+' => Some(62),
        b'-' => Some(63),
        _ => None,
    }
}

/**
 * Reads a little-endian base64 integer of the given width.
 */
fn decode_int(chars: &[u8]) -> usize {
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| decode_single(*c).unwrap_or(0) << (6 * i))
        .sum()
}

fn decode_trits(c: u8) -> [u8; 3] {
    let v = decode_single(c).unwrap_or(0) as u8;
    [v & 3, (v >> 2) & 3, (v >> 4) & 3]
}

/**
 * A cursor over the characters of a signature.
 */
struct SignatureReader<'a> {
    chars: &'a [u8],
    position: usize,
}

impl<'a> SignatureReader<'a> {
    fn at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.position + count > self.chars.len() {
            return Err(anyhow!("incomplete signature"));
        }
        let result = &self.chars[self.position..self.position + count];
        self.position += count;
        Ok(result)
    }

    fn take_single(&mut self) -> Result<usize> {
        Ok(decode_int(self.take(1)?))
    }
}

impl Triangulation {
    /**
     * Reconstructs a triangulation from its isomorphism signature.
     * Signatures of disconnected triangulations are concatenations of the
     * signatures of their components.
     */
    pub fn from_iso_sig(signature: &str) -> Result<Triangulation> {
        let trimmed = signature.trim();
        if trimmed.chars().any(|c| c.is_whitespace()) {
            return Err(anyhow!("unexpected internal whitespace in isomorphism signature `{}`", signature));
        }
        if let Some(c) = trimmed.bytes().find(|c| decode_single(*c).is_none()) {
            return Err(anyhow!("invalid character `{}` in isomorphism signature `{}`", c as char, signature));
        }

        let mut result = Triangulation::new();
        let mut reader = SignatureReader {
            chars: trimmed.as_bytes(),
            position: 0,
        };
        let mut component = 0;
        while !reader.at_end() {
            read_component(&mut reader, &mut result)
                .with_context(|| format!("decoding component {} of isomorphism signature `{}`", component, signature))?;
            component += 1;
        }

        log::debug!("decoded isomorphism signature {} into {} tetrahedra", signature, result.size());
        Ok(result)
    }
}

fn read_component(reader: &mut SignatureReader, result: &mut Triangulation) -> Result<()> {
    let mut size = reader.take_single()?;
    let chars_per_index = if size < 63 {
        1
    } else {
        let width = reader.take_single()?;
        size = decode_int(reader.take(width)?);
        width
    };

    if size == 0 {
        return Ok(());
    }

    //facet actions: 0 = boundary, 1 = glue to a new tetrahedron, 2 = glue to an existing one
    let mut actions = vec![];
    let mut facets = 0;
    let mut joins = 0;
    while facets < FACETS * size {
        let trits = decode_trits(reader.take(1)?[0]);
        for trit in trits {
            if facets == FACETS * size {
                if trit != 0 {
                    return Err(anyhow!("extraneous facet actions"));
                }
                continue;
            }
            match trit {
                0 => facets += 1,
                1 => facets += 2,
                2 => {
                    facets += 2;
                    joins += 1;
                }
                _ => return Err(anyhow!("invalid facet action")),
            }
            if facets > FACETS * size {
                return Err(anyhow!("facet actions do not match the triangulation size"));
            }
            actions.push(trit);
        }
    }

    let mut destinations = Vec::with_capacity(joins);
    for _ in 0..joins {
        destinations.push(decode_int(reader.take(chars_per_index)?));
    }

    let mut gluings = Vec::with_capacity(joins);
    for _ in 0..joins {
        let index = decode_int(reader.take(CHARS_PER_PERM)?);
        gluings.push(Perm4::from_ordered_index(index).ok_or_else(|| anyhow!("invalid gluing permutation {}", index))?);
    }

    let offset = result.size();
    for _ in 0..size {
        result.add_tetrahedron();
    }

    let mut actions = actions.into_iter();
    let mut next_unused = 1;
    let mut join = 0;
    for tetrahedron in 0..size {
        for facet in 0..FACETS {
            if result.adjacent(offset + tetrahedron, facet).is_some() {
                continue;
            }

            match actions.next() {
                Some(0) => {}
                Some(1) => {
                    if next_unused >= size {
                        return Err(anyhow!("gluing to a non-existent tetrahedron"));
                    }
                    result.try_join(offset + tetrahedron, facet, offset + next_unused, Perm4::IDENTITY)?;
                    next_unused += 1;
                }
                Some(_) => {
                    let destination = destinations[join];
                    let gluing = gluings[join];
                    if destination >= next_unused || result.adjacent(offset + destination, gluing.apply(facet)).is_some() {
                        return Err(anyhow!("invalid gluing destination"));
                    }
                    result
                        .try_join(offset + tetrahedron, facet, offset + destination, gluing)
                        .context("invalid gluing destination")?;
                    join += 1;
                }
                None => return Err(anyhow!("facet actions do not match the triangulation size")),
            }
        }
    }

    Ok(())
}
