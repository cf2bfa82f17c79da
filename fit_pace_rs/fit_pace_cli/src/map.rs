use anyhow::{anyhow, Result};

const TRACK_PLACEHOLDER: &str = "__TRACK__";

const LEAFLET_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Route</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
var track = __TRACK__;
var map = L.map('map');
L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);
var route = L.polyline(track, {color: 'crimson', weight: 3}).addTo(map);
L.circleMarker(track[0], {radius: 6, color: 'green'}).bindTooltip('Start').addTo(map);
L.circleMarker(track[track.length - 1], {radius: 6, color: 'black'}).bindTooltip('Finish').addTo(map);
map.fitBounds(route.getBounds());
</script>
</body>
</html>
"#;

/// Leaflet page drawing the `(lat, lon)` track with start and finish markers.
pub fn route_map_html(track: &[(f64, f64)]) -> Result<String> {
    if track.is_empty() {
        return Err(anyhow!("route map needs at least one position"));
    }
    let coords: Vec<[f64; 2]> = track.iter().map(|&(lat, lon)| [lat, lon]).collect();
    let json = serde_json::to_string(&coords)?;
    Ok(LEAFLET_TEMPLATE.replace(TRACK_PLACEHOLDER, &json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_track_as_lat_lon_pairs() {
        let html = route_map_html(&[(52.5, 13.25), (52.5001, 13.2502)]).unwrap();
        assert!(html.contains("var track = [[52.5,13.25],[52.5001,13.2502]];"));
        assert!(!html.contains(TRACK_PLACEHOLDER));
    }

    #[test]
    fn empty_track_is_an_error() {
        assert!(route_map_html(&[]).is_err());
    }
}
