//! SVG rendering of instances and tours.
//!
//! Every point is drawn, with radius and colour growing with its weight, so
//! the points a tour skips stand out as the heavy ones.

use crate::error::Result;
use crate::instance::Instance;
use crate::solution::Solution;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Radius of the lightest point
    pub min_radius: f64,
    /// Radius of the heaviest point
    pub max_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            min_radius: 2.0,
            max_radius: 9.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bounds(&self, instance: &Instance) -> (f64, f64, f64, f64) {
        instance.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_x, max_x, min_y, max_y), p| {
                let (x, y) = (p.x as f64, p.y as f64);
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            },
        )
    }

    /// Point weight mapped to [0, 1]
    fn weight_ratio(instance: &Instance, weight: i64) -> f64 {
        let min_w = instance.points.iter().map(|p| p.weight).min().unwrap_or(0);
        let max_w = instance.points.iter().map(|p| p.weight).max().unwrap_or(0);
        if max_w == min_w {
            return 0.5;
        }
        (weight - min_w) as f64 / (max_w - min_w) as f64
    }

    /// Generate SVG visualization of a solution
    pub fn generate_svg(&self, instance: &Instance, solution: &Solution) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .edge {{ stroke: #34495e; stroke-width: 1.5; fill: none; }}
    .visited {{ stroke: #2c3e50; stroke-width: 1; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Score: {} | Visited: {}/{}</text>
"##,
            self.margin,
            instance.name,
            solution.score,
            solution.tour.len(),
            instance.len()
        ));

        if instance.is_empty() {
            svg.push_str("</svg>\n");
            return svg;
        }

        let (min_x, max_x, min_y, max_y) = self.bounds(instance);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);
        let transform = |x: i64, y: i64| -> (f64, f64) {
            let tx = self.margin + (x as f64 - min_x) * scale;
            let ty = self.height - self.margin - (y as f64 - min_y) * scale;
            (tx, ty)
        };

        if solution.tour.len() > 1 {
            let coords: Vec<String> = solution
                .tour
                .iter()
                .map(|&p| {
                    let (x, y) = transform(instance.points[p].x, instance.points[p].y);
                    format!("{:.2},{:.2}", x, y)
                })
                .collect();
            svg.push_str(&format!(r#"<polygon points="{}" class="edge"/>
"#, coords.join(" ")));
        }

        let mut on_tour = vec![false; instance.len()];
        for &p in &solution.tour {
            if p < on_tour.len() {
                on_tour[p] = true;
            }
        }

        for (idx, point) in instance.points.iter().enumerate() {
            let (x, y) = transform(point.x, point.y);
            let ratio = Self::weight_ratio(instance, point.weight);
            let radius = self.min_radius + ratio * (self.max_radius - self.min_radius);
            // Light points green, heavy points red
            let red = (46.0 + ratio * (231.0 - 46.0)) as u8;
            let green = (204.0 - ratio * (204.0 - 76.0)) as u8;
            let blue = (113.0 - ratio * (113.0 - 60.0)) as u8;
            let class = if on_tour[idx] { r#" class="visited""# } else { "" };
            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="#{:02x}{:02x}{:02x}" fill-opacity="{}"{}/>
"##,
                x,
                y,
                radius,
                red,
                green,
                blue,
                if on_tour[idx] { "1.0" } else { "0.45" },
                class
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, instance: &Instance, solution: &Solution, path: P) -> Result<()> {
        let svg = self.generate_svg(instance, solution);
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests_support::delta_instance;

    #[test]
    fn test_svg_draws_every_point_and_the_tour() {
        let instance = delta_instance();
        let solution = Solution::from_tour(&instance, vec![0, 1, 2, 3], "test");
        let svg = Visualizer::new().generate_svg(&instance, &solution);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), instance.len());
        assert_eq!(svg.matches(r#"class="visited""#).count(), 4);
        assert_eq!(svg.matches("<polygon").count(), 1);
        assert!(svg.contains(&format!("Score: {}", solution.score)));
    }

    #[test]
    fn test_heavier_points_are_larger() {
        let instance = delta_instance();
        let light = Visualizer::weight_ratio(&instance, instance.weight(5));
        let heavy = Visualizer::weight_ratio(&instance, instance.weight(4));
        assert_eq!(light, 0.0);
        assert_eq!(heavy, 1.0);
    }

    #[test]
    fn test_save_svg() {
        let instance = delta_instance();
        let solution = Solution::from_tour(&instance, vec![0, 2], "test");
        let path = std::env::temp_dir().join("wts_visualization_test.svg");
        Visualizer::new().save_svg(&instance, &solution, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(written.contains("<polygon"));
    }
}
