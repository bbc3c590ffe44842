//! Conversions between the supported coordinate reference systems.
//!
//! WGS84↔GCJ02 uses the standard obfuscation polynomials with an iterative
//! inverse. GCJ02↔BD09 uses the published theta transform, and BD09
//! lat/lon↔Mercator uses Baidu's piecewise band tables. All conversions
//! outside the approximate China region are the identity, since GCJ02
//! obfuscation only applies there.

use crate::point::ReferenceSystem;

const PI: f64 = std::f64::consts::PI;
const X_PI: f64 = PI * 3000.0 / 180.0;
/// Krasovsky 1940 ellipsoid semi-major axis.
const A: f64 = 6_378_245.0;
/// Krasovsky 1940 first eccentricity squared.
const EE: f64 = 0.006_693_421_622_965_943;

/// Returns whether a WGS84 coordinate lies in the region where GCJ02
/// obfuscation applies.
///
/// Deliberately approximate: a coarse mainland bounding box minus a
/// carve-out roughly covering Taiwan. Good enough to decide whether to
/// run the transform; not a border dataset.
#[must_use]
pub fn is_in_china(lat: f64, lon: f64) -> bool {
    let in_bounds = (18.0..=53.6).contains(&lat) && (73.5..=135.1).contains(&lon);
    let in_taiwan_carveout = (21.5..=25.4).contains(&lat) && (119.9..=122.1).contains(&lon);
    in_bounds && !in_taiwan_carveout
}

/// Converts `(lat, lon)` from `source` into `target`.
///
/// Composed from the pairwise conversions below; `source == target`
/// returns the input unchanged.
#[must_use]
pub fn convert(
    source: ReferenceSystem,
    target: ReferenceSystem,
    lat: f64,
    lon: f64,
) -> (f64, f64) {
    use ReferenceSystem::{Bd09Mc, Gcj02, Wgs84};
    match (source, target) {
        (Wgs84, Wgs84) | (Gcj02, Gcj02) | (Bd09Mc, Bd09Mc) => (lat, lon),
        (Wgs84, Gcj02) => wgs84_to_gcj02(lat, lon),
        (Gcj02, Wgs84) => gcj02_to_wgs84(lat, lon),
        (Gcj02, Bd09Mc) => {
            let (lat, lon) = gcj02_to_bd09ll(lat, lon);
            bd09ll_to_bd09mc(lat, lon)
        }
        (Bd09Mc, Gcj02) => {
            let (lat, lon) = bd09mc_to_bd09ll(lat, lon);
            bd09ll_to_gcj02(lat, lon)
        }
        (Wgs84, Bd09Mc) => {
            let (lat, lon) = wgs84_to_gcj02(lat, lon);
            convert(Gcj02, Bd09Mc, lat, lon)
        }
        (Bd09Mc, Wgs84) => {
            let (lat, lon) = convert(Bd09Mc, Gcj02, lat, lon);
            gcj02_to_wgs84(lat, lon)
        }
    }
}

#[must_use]
pub fn wgs84_to_gcj02(lat: f64, lon: f64) -> (f64, f64) {
    if !is_in_china(lat, lon) {
        return (lat, lon);
    }
    let dlat = transform_lat(lon - 105.0, lat - 35.0);
    let dlon = transform_lon(lon - 105.0, lat - 35.0);
    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - EE * rad_lat.sin() * rad_lat.sin();
    let sqrt_magic = magic.sqrt();
    let dlat = (dlat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrt_magic) * PI);
    let dlon = (dlon * 180.0) / (A / sqrt_magic * rad_lat.cos() * PI);
    (lat + dlat, lon + dlon)
}

/// Iterative inverse of [`wgs84_to_gcj02`]; exact closed-form inversion
/// does not exist. Converges well below 1e-7 degrees within a few rounds.
#[must_use]
pub fn gcj02_to_wgs84(lat: f64, lon: f64) -> (f64, f64) {
    if !is_in_china(lat, lon) {
        return (lat, lon);
    }
    let mut wgs_lat = lat;
    let mut wgs_lon = lon;
    for _ in 0..30 {
        let (g_lat, g_lon) = wgs84_to_gcj02(wgs_lat, wgs_lon);
        let d_lat = g_lat - lat;
        let d_lon = g_lon - lon;
        wgs_lat -= d_lat;
        wgs_lon -= d_lon;
        if d_lat.abs() < 1e-9 && d_lon.abs() < 1e-9 {
            break;
        }
    }
    (wgs_lat, wgs_lon)
}

#[must_use]
pub fn gcj02_to_bd09ll(lat: f64, lon: f64) -> (f64, f64) {
    let z = (lon * lon + lat * lat).sqrt() + 0.00002 * (lat * X_PI).sin();
    let theta = lat.atan2(lon) + 0.000003 * (lon * X_PI).cos();
    (z * theta.sin() + 0.006, z * theta.cos() + 0.0065)
}

#[must_use]
pub fn bd09ll_to_gcj02(lat: f64, lon: f64) -> (f64, f64) {
    let x = lon - 0.0065;
    let y = lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * X_PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * X_PI).cos();
    (z * theta.sin(), z * theta.cos())
}

const MC_BAND: [f64; 6] = [12_890_594.86, 8_362_377.87, 5_591_021.0, 3_481_989.83, 1_678_043.12, 0.0];

#[rustfmt::skip]
const MC_TO_LL: [[f64; 10]; 6] = [
    [1.410_526_172_116_255e-8, 8.983_055_096_488_72e-6, -1.993_983_381_633_1, 200.982_438_310_679_6, -187.240_370_381_554_7, 91.608_751_666_984_3, -23.387_656_496_033_39, 2.571_213_172_961_98, -0.038_010_033_086_53, 17_337_981.2],
    [-7.435_856_389_565_537e-9, 8.983_055_097_726_239e-6, -0.786_252_018_862_89, 96.326_875_997_598_46, -1.852_047_575_298_26, -59.369_359_054_858_77, 47.400_335_492_967_37, -16.507_419_310_638_87, 2.287_866_746_993_75, 10_260_144.86],
    [-3.030_883_460_898_826e-8, 8.983_055_099_835_78e-6, 0.300_713_162_876_16, 59.742_936_184_422_77, 7.357_984_074_871, -25.383_710_026_647_45, 13.453_805_211_109_08, -3.298_837_672_355_84, 0.327_109_053_634_75, 6_856_817.37],
    [-1.981_981_304_930_552e-8, 8.983_055_099_779_535e-6, 0.032_781_828_525_91, 40.316_785_277_057_44, 0.656_592_986_772_77, -4.442_555_344_774_92, 0.853_419_118_052_63, 0.129_233_479_982_04, -0.046_257_360_075_61, 4_482_777.06],
    [3.091_913_710_684_37e-9, 8.983_055_096_812_155e-6, 6.995_724_062e-5, 23.109_343_041_449_01, -2.366_349_051_1e-4, -0.632_181_781_024_2, -0.006_634_944_672_73, 0.034_300_823_979_53, -0.004_660_438_763_32, 2_555_164.4],
    [2.890_871_144_776_878e-9, 8.983_055_095_805_407e-6, -3.068_298e-8, 7.471_370_254_680_32, -3.539_379_94e-6, -0.021_451_448_610_37, -1.234_426_596e-5, 1.032_295_277_3e-4, -3.238_903_64e-6, 826_088.5],
];

const LL_BAND: [f64; 6] = [75.0, 60.0, 45.0, 30.0, 15.0, 0.0];

#[rustfmt::skip]
const LL_TO_MC: [[f64; 10]; 6] = [
    [-0.001_570_210_244_4, 111_320.702_061_693_9, 1_704_480_524_535_203.0, -10_338_987_376_042_340.0, 26_112_667_856_603_880.0, -35_149_669_176_653_700.0, 26_595_700_718_403_920.0, -10_725_012_454_188_240.0, 1_800_819_912_950_474.0, 82.5],
    [8.277_824_516_172_526e-4, 111_320.702_046_357_8, 647_795_574.667_160_7, -4_082_003_173.641_316, 10_774_905_663.511_42, -15_171_875_531.515_59, 12_053_065_338.621_67, -5_124_939_663.577_472, 913_311_935.951_203_2, 67.5],
    [0.003_373_987_667_65, 111_320.702_020_216_2, 4_481_351.045_890_365, -23_393_751.199_316_62, 79_682_215.471_864_55, -115_964_993.279_725_3, 97_236_711.156_021_45, -43_661_946.337_528_21, 8_477_230.501_135_234, 52.5],
    [0.002_206_364_962_08, 111_320.702_020_912_8, 51_751.861_128_411_31, 3_796_837.749_470_245, 992_013.739_779_101_3, -1_221_952.217_112_87, 1_340_652.697_009_075, -620_943.699_098_431_2, 144_416.929_380_624_1, 37.5],
    [-3.441_963_504_368_392e-4, 111_320.702_057_685_6, 278.235_398_077_275_2, 2_485_758.690_035_394, 6_070.750_963_243_378, 54_821.183_453_521_18, 9_540.606_633_304_236, -2_710.553_267_466_45, 1_405.483_844_121_726, 22.5],
    [-3.218_135_878_613_132e-4, 111_320.702_070_161_5, 0.003_693_834_312_89, 823_725.640_279_571_8, 0.461_049_869_090_93, 2_351.343_141_331_292, 1.580_607_842_981_99, 8.777_385_890_782_84, 0.372_388_842_524_24, 7.45],
];

fn apply_band(table: &[f64; 10], abs_x: f64, abs_y: f64) -> (f64, f64) {
    let x = table[0] + table[1] * abs_x;
    let c = abs_y / table[9];
    let mut y = 0.0;
    let mut power = 1.0;
    for coefficient in &table[2..9] {
        y += coefficient * power;
        power *= c;
    }
    (x, y)
}

/// BD09 Mercator meters → BD09 lat/lon, via Baidu's band tables.
#[must_use]
pub fn bd09mc_to_bd09ll(y: f64, x: f64) -> (f64, f64) {
    let abs_x = x.abs();
    let abs_y = y.abs();
    let table = MC_BAND
        .iter()
        .position(|band| abs_y >= *band)
        .map_or(&MC_TO_LL[5], |i| &MC_TO_LL[i]);
    let (lon, lat) = apply_band(table, abs_x, abs_y);
    (lat.copysign(y), lon.copysign(x))
}

/// BD09 lat/lon → BD09 Mercator meters, via Baidu's band tables.
#[must_use]
pub fn bd09ll_to_bd09mc(lat: f64, lon: f64) -> (f64, f64) {
    let abs_lon = lon.abs();
    let abs_lat = lat.abs();
    let table = LL_BAND
        .iter()
        .position(|band| abs_lat >= *band)
        .map_or(&LL_TO_MC[5], |i| &LL_TO_MC[i]);
    let (x, y) = apply_band(table, abs_lon, abs_lat);
    (y.copysign(lat), x.copysign(lon))
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lon(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

#[cfg(test)]
#[path = "geodesy_test.rs"]
mod tests;
