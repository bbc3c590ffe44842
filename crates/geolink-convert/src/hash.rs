//! Reversible coordinate-hash decoders used by provider links.
//!
//! Each decoder is a pure function from the encoded string to
//! `(lat, lon, zoom)`. Zoom is derived from the string length: a longer
//! string encodes more refinement bits and therefore a closer view.

/// Decoded coordinates plus the zoom level implied by the hash length.
pub type DecodedHash = (f64, f64, f64);

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Decodes a base-32 geohash as used in Waze live-map links.
///
/// Bits alternate longitude/latitude starting with longitude; each
/// coordinate is the midpoint of its final interval. Zoom is the hash
/// length plus one.
///
/// `"ezs42"` decodes to `(42.60498046875, -5.60302734375, 6.0)`.
#[must_use]
pub fn decode_waze_geohash(hash: &str) -> Option<DecodedHash> {
    if hash.is_empty() {
        return None;
    }
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut lon = (-180.0_f64, 180.0_f64);
    let mut even = true;
    for c in hash.chars() {
        let index = GEOHASH_ALPHABET.find(c.to_ascii_lowercase())?;
        for bit in (0..5).rev() {
            let high = (index >> bit) & 1 == 1;
            let interval = if even { &mut lon } else { &mut lat };
            let mid = (interval.0 + interval.1) / 2.0;
            if high {
                interval.0 = mid;
            } else {
                interval.1 = mid;
            }
            even = !even;
        }
    }
    let lat = (lat.0 + lat.1) / 2.0;
    let lon = (lon.0 + lon.1) / 2.0;
    #[allow(clippy::cast_precision_loss)]
    let zoom = (hash.chars().count() + 1) as f64;
    Some((lat, lon, zoom))
}

const OSM_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_~";

/// Decodes an OpenStreetMap `/go/` short-link quad-tile hash.
///
/// Each character carries three x and three y bits, interleaved x-first.
/// Trailing `-` characters are precision padding: each one lowers the
/// implied zoom, with `zoom = 3n - 8 - ((3 - pad) mod 3)` for `n` coding
/// characters. `=` is ignored, `@` is accepted as the legacy spelling of
/// `~`.
///
/// `"0EEQjE--"` decodes to `(51.510772705078125, 0.054931640625, 9.0)`.
#[must_use]
pub fn decode_osm_shortlink(hash: &str) -> Option<DecodedHash> {
    let mut x: u64 = 0;
    let mut y: u64 = 0;
    let mut bits: u32 = 0;
    let mut pad: u32 = 0;
    for c in hash.chars() {
        let c = if c == '@' { '~' } else { c };
        if let Some(index) = OSM_ALPHABET.find(c) {
            let index = index as u64;
            for i in (0..3).rev() {
                x = (x << 1) | ((index >> (2 * i + 1)) & 1);
                y = (y << 1) | ((index >> (2 * i)) & 1);
            }
            bits += 3;
        } else if c == '-' {
            pad += 1;
        } else if c != '=' {
            return None;
        }
    }
    if bits == 0 || bits > 48 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = (1u64 << bits) as f64;
    #[allow(clippy::cast_precision_loss)]
    let lon = x as f64 / scale * 360.0 - 180.0;
    #[allow(clippy::cast_precision_loss)]
    let lat = y as f64 / scale * 180.0 - 90.0;
    let zoom = f64::from(bits) - 8.0 - f64::from((3 - (pad % 3)) % 3);
    Some((lat, lon, zoom.max(1.0)))
}

const GE0_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const GE0_MAX_CHARS: u32 = 10;

/// Decodes a `ge0://` / `omaps.app` base-64 point code.
///
/// The first character encodes zoom as `4 + index / 4`. Remaining
/// characters carry three latitude and three longitude bits each,
/// latitude first. Codes shorter than ten characters are padded up to the
/// full 30 bits with a middle-of-cell offset, which rounds slightly
/// differently from averaging the cell bounds; that behavior is kept
/// as-is because shared links round-trip through it.
#[must_use]
pub fn decode_ge0(code: &str) -> Option<DecodedHash> {
    let mut chars = code.chars();
    let zoom_index = GE0_ALPHABET.find(chars.next()?)?;
    #[allow(clippy::cast_precision_loss)]
    let zoom = zoom_index as f64 / 4.0 + 4.0;

    let mut lat_bits: u64 = 0;
    let mut lon_bits: u64 = 0;
    let mut used: u32 = 0;
    for c in chars.take(GE0_MAX_CHARS as usize) {
        let index = GE0_ALPHABET.find(c)? as u64;
        let lat3 = ((index >> 5 & 1) << 2) | ((index >> 3 & 1) << 1) | (index >> 1 & 1);
        let lon3 = ((index >> 4 & 1) << 2) | ((index >> 2 & 1) << 1) | (index & 1);
        lat_bits = (lat_bits << 3) | lat3;
        lon_bits = (lon_bits << 3) | lon3;
        used += 1;
    }
    if used == 0 {
        return None;
    }
    if used < GE0_MAX_CHARS {
        let shift = 3 * (GE0_MAX_CHARS - used);
        let middle = 1u64 << (shift - 1);
        lat_bits = (lat_bits << shift) + middle;
        lon_bits = (lon_bits << shift) + middle;
    }
    let scale = f64::from(1u32 << 30);
    #[allow(clippy::cast_precision_loss)]
    let lat = lat_bits as f64 / scale * 180.0 - 90.0;
    #[allow(clippy::cast_precision_loss)]
    let lon = lon_bits as f64 / scale * 360.0 - 180.0;
    Some((lat, lon, zoom))
}
