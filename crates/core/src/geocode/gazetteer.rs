//! Offline table of Ghanaian places for name lookup and nearest-place naming.

use super::Place;

/// Within this distance (degrees) a point is named after the nearest known place.
const NEAREST_PLACE_MAX_DEGREES: f64 = 0.05;

// Lookup order matters for partial matches: first hit wins.
const PLACES: &[(&str, f64, f64)] = &[
    // Accra and neighbourhoods
    ("accra", 5.6037, -0.1870),
    ("east legon", 5.6361, -0.1545),
    ("airport", 5.6026, -0.1691),
    ("cantonments", 5.5778, -0.1831),
    ("osu", 5.5560, -0.1870),
    ("labone", 5.5641, -0.1745),
    ("adenta", 5.7071, -0.1665),
    ("tema", 5.6698, -0.0168),
    ("teshie", 5.5918, -0.1122),
    ("nungua", 5.6010, -0.0741),
    ("dansoman", 5.5338, -0.2570),
    ("kasoa", 5.5257, -0.4195),
    ("madina", 5.6682, -0.1665),
    ("shiashie", 5.6469, -0.1599),
    ("spintex", 5.6326, -0.1241),
    ("lapaz", 5.6073, -0.2542),
    ("achimota", 5.6197, -0.2284),
    // Other major cities
    ("kumasi", 6.6885, -1.6244),
    ("takoradi", 4.8970, -1.7550),
    ("tamale", 9.4047, -0.8424),
    ("cape coast", 5.1053, -1.2466),
    ("koforidua", 6.0945, 0.0554),
    ("ho", 6.6011, 0.4714),
    ("sunyani", 7.3349, -2.3269),
    ("techiman", 7.5912, -1.9382),
    ("wa", 10.0579, -2.5137),
    ("bolgatanga", 10.7867, -0.8500),
];

struct Region {
    name: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
}

const REGIONS: &[Region] = &[
    Region {
        name: "Greater Accra",
        lat: (5.5, 5.8),
        lon: (-0.3, -0.05),
    },
    Region {
        name: "Kumasi Area",
        lat: (6.5, 7.0),
        lon: (-1.8, -1.4),
    },
];

fn to_place(name: &str, lat: f64, lon: f64) -> Place {
    Place {
        lat,
        lon,
        display_name: title_case(name),
        place_type: None,
    }
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact (case-insensitive) match, then substring match either way, then Accra.
pub fn lookup_location(name: &str) -> Place {
    let needle = name.trim().to_lowercase();

    if let Some((key, lat, lon)) = PLACES.iter().find(|(key, _, _)| *key == needle) {
        return to_place(key, *lat, *lon);
    }

    if let Some((key, lat, lon)) = PLACES
        .iter()
        .find(|(key, _, _)| needle.contains(key) || key.contains(needle.as_str()))
    {
        return to_place(key, *lat, *lon);
    }

    let (key, lat, lon) = PLACES[0];
    to_place(key, lat, lon)
}

/// A display name for a coordinate: nearest known place, then region, then the raw point.
pub fn reverse_geocode(lat: f64, lon: f64) -> String {
    let nearest = PLACES
        .iter()
        .map(|(key, plat, plon)| (key, ((lat - plat).powi(2) + (lon - plon).powi(2)).sqrt()))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((key, distance)) = nearest {
        if distance < NEAREST_PLACE_MAX_DEGREES {
            return title_case(key);
        }
    }

    for region in REGIONS {
        if (region.lat.0..=region.lat.1).contains(&lat) && (region.lon.0..=region.lon.1).contains(&lon)
        {
            return region.name.to_string();
        }
    }

    format!("Location at ({lat}, {lon})")
}
