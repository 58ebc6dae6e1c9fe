//! In-memory challenge store.
//!
//! One coarse lock guards the whole map; every operation holds it for a
//! lookup/insert/delete plus constant-time expiry arithmetic. Image synthesis
//! happens before the lock is taken.
//!
//! Expired entries are swept when a new challenge is issued, or lazily when a
//! lookup finds one. There is no background timer, so an idle process keeps
//! stale entries until the next issue.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::distributions::{Alphanumeric, Distribution, Slice};
use rand::Rng;

use crate::captcha::canvas::{Canvas, Rgb};
use crate::captcha::{font, png};
use crate::clock::Clock;
use crate::config::CaptchaConfig;
use crate::error::ChallengeError;
use crate::observability::metrics;

const BACKGROUND: Rgb = [243, 245, 248];

/// One issued puzzle. The answer is stored case-folded.
#[derive(Debug, Clone)]
struct Challenge {
    answer: String,
    expires_at: Instant,
}

/// What the issue endpoint hands back.
#[derive(Debug, Clone)]
pub struct IssuedCaptcha {
    pub id: String,
    /// `data:image/png;base64,...`
    pub image: String,
    pub expires_in: Duration,
}

/// Issues and verifies short-lived captcha challenges.
#[derive(Debug)]
pub struct CaptchaStore {
    entries: Mutex<HashMap<String, Challenge>>,
    config: CaptchaConfig,
    alphabet: Vec<char>,
    clock: Arc<dyn Clock>,
}

impl CaptchaStore {
    pub fn new(config: CaptchaConfig, clock: Arc<dyn Clock>) -> Self {
        let alphabet = config.alphabet.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            alphabet,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    /// Number of stored challenges, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw an answer, render it, and store it under a fresh id.
    pub fn generate(&self) -> io::Result<IssuedCaptcha> {
        self.issue(&self.random_answer())
    }

    /// Render and store a caller-chosen answer.
    pub fn issue(&self, answer: &str) -> io::Result<IssuedCaptcha> {
        let image = png::encode_data_uri(&self.render(answer))?;
        let id = self.insert(answer);

        Ok(IssuedCaptcha {
            id,
            image,
            expires_in: self.ttl(),
        })
    }

    /// `true` iff `id` exists, has not expired and `answer` matches
    /// case-insensitively. A match with `consume` removes the entry.
    pub fn verify(&self, id: &str, answer: &str, consume: bool) -> bool {
        self.check(id, answer, consume).is_ok()
    }

    /// [`verify`](Self::verify) with the failure reason, for logging.
    pub fn check(&self, id: &str, answer: &str, consume: bool) -> Result<(), ChallengeError> {
        let now = self.clock.monotonic_now();
        let candidate = answer.trim().to_lowercase();

        let (result, live) = {
            let mut entries = self.lock();
            let state = entries
                .get(id)
                .map(|c| (now > c.expires_at, c.answer == candidate));
            let result = match state {
                None => Err(ChallengeError::NotFound),
                Some((true, _)) => {
                    entries.remove(id);
                    Err(ChallengeError::Expired)
                }
                Some((false, false)) => Err(ChallengeError::Mismatch),
                Some((false, true)) => {
                    if consume {
                        entries.remove(id);
                    }
                    Ok(())
                }
            };
            (result, entries.len())
        };

        let outcome = match result {
            Ok(()) => "success",
            Err(ChallengeError::NotFound) => "not_found",
            Err(ChallengeError::Expired) => "expired",
            Err(ChallengeError::Mismatch) => "mismatch",
        };
        metrics::record_captcha_verification(outcome, live);
        result
    }

    /// Remove every expired challenge. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.monotonic_now();
        let mut entries = self.lock();
        sweep(&mut entries, now)
    }

    fn insert(&self, answer: &str) -> String {
        let id = self.random_id();
        let now = self.clock.monotonic_now();
        let challenge = Challenge {
            answer: answer.to_lowercase(),
            expires_at: now + self.ttl(),
        };

        let live = {
            let mut entries = self.lock();
            let swept = sweep(&mut entries, now);
            if swept > 0 {
                tracing::debug!(swept, "Swept expired captchas");
            }
            entries.insert(id.clone(), challenge);
            entries.len()
        };
        metrics::record_captcha_issued(live);
        id
    }

    fn random_answer(&self) -> String {
        let mut rng = rand::thread_rng();
        match Slice::new(&self.alphabet) {
            Ok(letters) => letters.sample_iter(&mut rng).take(self.config.length).collect(),
            // Validation rejects an empty alphabet; fall back to alphanumerics.
            Err(_) => (0..self.config.length)
                .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
                .collect(),
        }
    }

    fn random_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.config.id_length)
            .map(char::from)
            .collect()
    }

    /// Background, noise lines, noise dots, then the centered answer.
    fn render(&self, answer: &str) -> Canvas {
        let (w, h) = (self.config.width, self.config.height);
        let mut canvas = Canvas::new(w, h, BACKGROUND);
        let (wi, hi) = (w as i32, h as i32);

        for _ in 0..self.config.noise_lines {
            let from = (fastrand::i32(0..wi.max(1)), fastrand::i32(0..hi.max(1)));
            let to = (fastrand::i32(0..wi.max(1)), fastrand::i32(0..hi.max(1)));
            canvas.line(from, to, random_color(120, 200));
        }

        for _ in 0..self.config.noise_dots {
            let x = fastrand::i32(0..wi.max(1));
            let y = fastrand::i32(0..hi.max(1));
            canvas.put(x, y, random_color(0, 255));
        }

        let count = answer.chars().count();
        let (mut x, y) = canvas.centered_text_origin(count);
        let advance = (font::GLYPH_WIDTH * font::SCALE + font::SPACING) as i32;
        for c in answer.chars() {
            canvas.glyph(c, x, y, random_color(20, 110));
            x += advance;
        }

        canvas
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Challenge>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep(entries: &mut HashMap<String, Challenge>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, c| c.expires_at >= now);
    before - entries.len()
}

fn random_color(min: u8, max: u8) -> Rgb {
    [
        fastrand::u8(min..=max),
        fastrand::u8(min..=max),
        fastrand::u8(min..=max),
    ]
}
