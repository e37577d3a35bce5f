//! Serialise the particles into a standalone SVG document.

use crate::particle::Particle;

/// The SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The SVG version declared in exported documents.
pub const SVG_VERSION: &str = "1.2";

/// Build an SVG document containing one square for every particle inside the canvas.
#[must_use]
pub fn svg_document(particles: &[Particle], width: f64, height: f64, rotation: bool) -> String {
    let mut document = format!(
        r#"<svg xmlns="{SVG_NAMESPACE}" version="{SVG_VERSION}" width="{width}" height="{height}">"#
    );
    for particle in particles {
        if let Some(element) = rect_element(particle, width, height, rotation) {
            document.push_str(&element);
        }
    }
    document.push_str("</svg>");
    document
}

/// A particle as a `<rect>`, or nothing if it's outside the canvas.
fn rect_element(particle: &Particle, width: f64, height: f64, rotation: bool) -> Option<String> {
    let pos = particle.pos;
    if !(0.0..=width).contains(&pos.x) || !(0.0..=height).contains(&pos.y) {
        return None;
    }

    let size = particle.size();
    let half = size / 2.0;
    let transform = if rotation {
        format!(
            r#" transform="rotate({}, {}, {})""#,
            particle.angle.to_degrees(),
            pos.x,
            pos.y
        )
    } else {
        String::new()
    };

    Some(format!(
        r#"<rect x="{}" y="{}" width="{size}" height="{size}" style="fill: {}"{transform}/>"#,
        pos.x - half,
        pos.y - half,
        particle.colour().to_css(),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vector::Vector2;

    fn particle(x: f64, y: f64) -> Particle {
        Particle::new(Vector2::new(x, y), 4.0, 0.5)
    }

    #[test]
    fn empty_document() {
        let svg = svg_document(&[], 100.0, 50.0, true);
        assert_eq!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.2" width="100" height="50"></svg>"#
        );
    }

    #[test]
    fn only_particles_inside_the_canvas() {
        let particles = [
            particle(10.0, 10.0),
            particle(-1.0, 10.0),
            particle(10.0, 51.0),
            particle(100.0, 50.0),
        ];
        let svg = svg_document(&particles, 100.0, 50.0, false);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(!svg.contains("transform"));
        assert!(svg.contains(r#"<rect x="8" y="8" width="4" height="4" style="fill: hsl(180,100%,41%)"/>"#));
    }

    #[test]
    fn nan_particles_are_left_out() {
        let mut lost = particle(10.0, 10.0);
        lost.pos = Vector2::new(f64::NAN, 10.0);
        let svg = svg_document(&[lost], 100.0, 50.0, false);
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn rotation_is_about_the_centre() {
        let mut spun = particle(20.0, 30.0);
        let svg = svg_document(&[spun.clone()], 100.0, 50.0, true);
        assert!(svg.contains(r#"x="18" y="28""#));
        assert!(svg.contains(r#"transform="rotate(0, 20, 30)""#));

        spun.angle = 1.0;
        let svg = svg_document(&[spun], 100.0, 50.0, true);
        let degrees = 1.0_f64.to_degrees();
        assert!(svg.contains(&format!(r#"transform="rotate({degrees}, 20, 30)""#)));
    }
}
