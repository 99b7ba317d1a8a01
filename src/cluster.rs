use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 5;
pub const PLAYSTYLE_FEATURES: [&str; FEATURE_COUNT] = [
    "level",
    "gold_left",
    "board_value",
    "three_star_count",
    "carry_unit_cost",
];
const MODEL_VERSION: u32 = 1;

pub type Point = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaystyleSample {
    pub values: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Point,
    pub scale: Point,
}

impl StandardScaler {
    /// Column mean and population standard deviation. Constant columns scale by 1.
    pub fn fit(points: &[Point]) -> Self {
        let mut mean = [0.0; FEATURE_COUNT];
        let mut scale = [1.0; FEATURE_COUNT];
        if points.is_empty() {
            return Self { mean, scale };
        }
        let n = points.len() as f64;
        for p in points {
            for (m, v) in mean.iter_mut().zip(p) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }
        for (col, s) in scale.iter_mut().enumerate() {
            let var = points.iter().map(|p| (p[col] - mean[col]).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            *s = if std > f64::EPSILON { std } else { 1.0 };
        }
        Self { mean, scale }
    }

    pub fn transform(&self, point: &Point) -> Point {
        let mut out = [0.0; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            out[col] = (point[col] - self.mean[col]) / self.scale[col];
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
}

#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
        }
    }

    /// Best of `n_init` seeded k-means++ runs, by inertia.
    pub fn fit(&self, points: &[Point]) -> Result<KMeansFit> {
        if self.k == 0 {
            bail!("k-means needs at least one cluster");
        }
        if points.len() < self.k {
            bail!(
                "k-means needs at least {} samples, got {}",
                self.k,
                points.len()
            );
        }
        let tol = self.tol * mean_variance(points);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;
        for _ in 0..self.n_init.max(1) {
            let run = self.run_once(points, tol, &mut rng);
            if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.ok_or_else(|| anyhow!("k-means produced no run"))
    }

    fn run_once(&self, points: &[Point], tol: f64, rng: &mut StdRng) -> KMeansFit {
        let mut centroids = kmeans_plus_plus(points, self.k, rng);
        let mut iterations = 0;
        for _ in 0..self.max_iter {
            iterations += 1;
            let assigned = assign(points, &centroids);
            let next = recompute_centroids(points, &assigned, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&next)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centroids = next;
            if shift <= tol {
                break;
            }
        }
        let assigned = assign(points, &centroids);
        KMeansFit {
            inertia: assigned.iter().map(|(_, d)| d).sum(),
            labels: assigned.into_iter().map(|(label, _)| label).collect(),
            centroids,
            iterations,
        }
    }
}

/// Index of the closest centroid. Ties go to the lowest index.
pub fn nearest(point: &Point, centroids: &[Point]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

fn assign(points: &[Point], centroids: &[Point]) -> Vec<(usize, f64)> {
    points.par_iter().map(|p| nearest(p, centroids)).collect()
}

fn recompute_centroids(points: &[Point], assigned: &[(usize, f64)], prev: &[Point]) -> Vec<Point> {
    let k = prev.len();
    let mut sums = vec![[0.0; FEATURE_COUNT]; k];
    let mut counts = vec![0usize; k];
    for (p, (label, _)) in points.iter().zip(assigned) {
        counts[*label] += 1;
        for (s, v) in sums[*label].iter_mut().zip(p) {
            *s += v;
        }
    }

    // Empty clusters take over the points worst served by their centroid.
    let mut far: Vec<usize> = (0..points.len()).collect();
    far.sort_by(|a, b| assigned[*b].1.total_cmp(&assigned[*a].1));
    let mut far = far.into_iter();

    let mut out = Vec::with_capacity(k);
    for (idx, sum) in sums.into_iter().enumerate() {
        if counts[idx] > 0 {
            let n = counts[idx] as f64;
            out.push(sum.map(|s| s / n));
        } else if let Some(p) = far.next() {
            out.push(points[p]);
        } else {
            out.push(prev[idx]);
        }
    }
    out
}

fn kmeans_plus_plus(points: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);
    let mut d2: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();
    while centroids.len() < k {
        let total: f64 = d2.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.gen_range(0.0..total);
            let mut acc = 0.0;
            d2.iter()
                .position(|d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or(points.len() - 1)
        } else {
            rng.gen_range(0..points.len())
        };
        let chosen = points[pick];
        centroids.push(chosen);
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &chosen));
        }
    }
    centroids
}

fn mean_variance(points: &[Point]) -> f64 {
    let scaler = StandardScaler::fit(points);
    let n = points.len() as f64;
    (0..FEATURE_COUNT)
        .map(|col| {
            points
                .iter()
                .map(|p| (p[col] - scaler.mean[col]).powi(2))
                .sum::<f64>()
                / n
        })
        .sum::<f64>()
        / FEATURE_COUNT as f64
}

pub fn squared_distance(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaystyleModel {
    pub version: u32,
    pub generated_at: String,
    pub features: Vec<String>,
    pub scaler: StandardScaler,
    /// Centroids in standardized space.
    pub centroids: Vec<Point>,
    pub inertia: f64,
    #[serde(default)]
    pub iterations: usize,
    pub samples: usize,
}

impl PlaystyleModel {
    pub fn clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn predict(&self, sample: &PlaystyleSample) -> usize {
        nearest(&self.scaler.transform(&sample.values), &self.centroids).0
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize model")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let model: Self = serde_json::from_str(&raw).context("invalid model json")?;
        if model.version != MODEL_VERSION {
            bail!("unsupported model version {}", model.version);
        }
        Ok(model)
    }
}

/// Standardizes the samples and clusters them. Returns the model and per-sample labels.
pub fn fit_playstyles(
    samples: &[PlaystyleSample],
    kmeans: &KMeans,
) -> Result<(PlaystyleModel, Vec<usize>)> {
    let raw: Vec<Point> = samples.iter().map(|s| s.values).collect();
    let scaler = StandardScaler::fit(&raw);
    let scaled: Vec<Point> = raw.iter().map(|p| scaler.transform(p)).collect();
    let fit = kmeans.fit(&scaled)?;
    let model = PlaystyleModel {
        version: MODEL_VERSION,
        generated_at: chrono::Utc::now().to_rfc3339(),
        features: PLAYSTYLE_FEATURES.iter().map(|s| s.to_string()).collect(),
        scaler,
        centroids: fit.centroids,
        inertia: fit.inertia,
        iterations: fit.iterations,
        samples: samples.len(),
    };
    Ok((model, fit.labels))
}
