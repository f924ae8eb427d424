use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

use crate::navigation::ChapterRef;

pub const BANNER: &str = "Chapter Complete!";

const SPARKS: [char; 5] = ['✦', '✧', '*', '+', '·'];

/// Particle for the chapter-complete animation
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters of the banner ease onto their target; sparks fall away.
    pub is_text: bool,
    pub target_x: f64,
    pub target_y: f64,
}

impl Particle {
    fn spark<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.0..2.0),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn letter(x: f64, y: f64, target_x: f64, target_y: f64, symbol: char, color: usize) -> Self {
        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            symbol,
            color_index: color,
            age: 0.0,
            max_age: f64::INFINITY,
            is_text: true,
            target_x,
            target_y,
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let pull = (6.0 * dt).min(1.0);
            self.x += (self.target_x - self.x) * pull;
            self.y += (self.target_y - self.y) * pull;
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist <= 0.5 {
                self.x = self.target_x;
                self.y = self.target_y;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += 15.0 * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Short burst shown while the next chapter is queued.
#[derive(Debug)]
pub struct ChapterCelebration {
    pub particles: Vec<Particle>,
    pub location: Option<ChapterRef>,
    pub duration: f64,
    pub is_active: bool,
    started: Instant,
    elapsed: f64,
    width: f64,
    height: f64,
}

impl ChapterCelebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            location: None,
            duration: 1.5,
            is_active: false,
            started: Instant::now(),
            elapsed: 0.0,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, location: ChapterRef, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.location = Some(location);
        self.started = Instant::now();
        self.elapsed = 0.0;
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;
        let text_width = BANNER.chars().count() as f64;
        let left = center_x - text_width / 2.0;
        let color = rng.gen_range(0..7);

        for (i, ch) in BANNER.chars().enumerate().filter(|(_, c)| *c != ' ') {
            self.particles.push(Particle::letter(
                center_x + rng.gen_range(-10.0..10.0),
                center_y + rng.gen_range(-4.0..4.0),
                left + i as f64,
                center_y - 2.0,
                ch,
                color,
            ));
        }
        for _ in 0..20 {
            let x = center_x + rng.gen_range(-15.0..15.0);
            let y = center_y + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::spark(x, y, &mut rng));
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
        self.location = None;
    }

    /// Advances to the wall-clock time since `start`.
    pub fn update(&mut self) {
        let target = self.started.elapsed().as_secs_f64();
        let dt = target - self.elapsed;
        if dt > 0.0 {
            self.advance(dt);
        }
    }

    pub fn advance(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(dt);
            let off_screen =
                !p.is_text && (p.y > height + 5.0 || p.x < -5.0 || p.x > width + 5.0);
            alive && !off_screen
        });
    }
}

impl Default for ChapterCelebration {
    fn default() -> Self {
        Self::new()
    }
}
