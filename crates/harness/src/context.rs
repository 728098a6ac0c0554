//! Per-run state
//!
//! Everything a run mutates between operations lives here: the random
//! source, the row counters and the event handler. Components receive the
//! context by `&mut` reference; nothing is global.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use kvformat_core::dump;
use kvformat_core::{
    EventHandler, FileType, FormatConfig, Generator, NoopHandler, OpRecord, Result, RowNumber,
};

/// State of one harness run.
#[derive(Debug)]
pub struct RunContext<H = NoopHandler> {
    config: FormatConfig,
    seed: u64,
    generator: Generator,
    rng: ChaCha8Rng,
    /// Current row count; grows when column-store appends land past it
    pub rows: RowNumber,
    /// Rows bulk-loaded so far
    pub key_cnt: RowNumber,
    /// Highest row number explicitly written to either store
    pub highest_written: RowNumber,
    handler: H,
}

impl RunContext<NoopHandler> {
    /// Validate `config` and set up a silent run.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid.
    pub fn new(config: FormatConfig) -> Result<Self> {
        Self::with_handler(config, NoopHandler)
    }
}

impl<H: EventHandler> RunContext<H> {
    /// Validate `config` and set up a run reporting to `handler`.
    ///
    /// The seed comes from the configuration, or from entropy when absent;
    /// the generator's length tables are drawn from it first.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid.
    pub fn with_handler(config: FormatConfig, handler: H) -> Result<Self> {
        config.validate()?;
        let seed = config.resolve_seed();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let generator = Generator::new(&config, &mut rng);
        Ok(RunContext {
            rows: config.rows,
            key_cnt: 0,
            highest_written: 0,
            config,
            seed,
            generator,
            rng,
            handler,
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Seed the run was started with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Schema variant of the run.
    pub fn file_type(&self) -> FileType {
        self.config.file_type
    }

    /// Key/value generator.
    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Random source.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Event handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Consume the context, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Row number uniform in `[1, rows]`.
    pub fn random_row(&mut self) -> RowNumber {
        self.rng.gen_range(1..=self.rows)
    }

    /// Uniform draw in `[low, high]`.
    pub fn random_between(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    /// Record that `row` was written.
    pub fn note_write(&mut self, row: RowNumber) {
        self.highest_written = self.highest_written.max(row);
    }

    /// The value the engine's not-found is taken to mean for `row`, when it
    /// is allowed to mean one: fixed-length rows past every written row read
    /// as zero.
    pub fn zero_fill(&self, row: Option<RowNumber>) -> Option<Vec<u8>> {
        match row {
            Some(r) if self.file_type() == FileType::Fix && r > self.highest_written => {
                Some(self.generator.zero_value())
            }
            _ => None,
        }
    }

    /// Forward a message to the handler.
    pub fn message(&mut self, message: &str) {
        self.handler.on_message(message);
    }

    /// Forward a progress counter to the handler.
    pub fn progress(&mut self, operation: &str, progress: u64) {
        self.handler.on_progress(operation, progress);
    }

    /// Emit the log line for a driver step, when operation logging is on.
    pub fn log_op(&mut self, record: &OpRecord) {
        if self.config.logging {
            let line = dump::op_line(self.config.file_type, record);
            self.handler.on_message(&line);
        }
    }

    /// Emit the log line for a bulk-loaded row, when operation logging is on.
    pub fn log_bulk(&mut self, row: RowNumber, key: Option<&[u8]>, value: &[u8]) {
        if self.config.logging {
            let line = dump::bulk_line(self.config.file_type, row, key, value);
            self.handler.on_message(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvformat_core::{OpKind, RecordingHandler};

    fn config(file_type: FileType) -> FormatConfig {
        FormatConfig {
            file_type,
            rows: 100,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = RunContext::new(config(FileType::Row)).unwrap();
        let mut b = RunContext::new(config(FileType::Row)).unwrap();
        let rows_a: Vec<_> = (0..20).map(|_| a.random_row()).collect();
        let rows_b: Vec<_> = (0..20).map(|_| b.random_row()).collect();
        assert_eq!(rows_a, rows_b);
        assert!(rows_a.iter().all(|r| (1..=100).contains(r)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = FormatConfig {
            rows: 0,
            ..Default::default()
        };
        assert!(RunContext::new(bad).is_err());
    }

    #[test]
    fn test_zero_fill_only_past_written_fix_rows() {
        let mut ctx = RunContext::new(config(FileType::Fix)).unwrap();
        ctx.note_write(100);
        assert_eq!(ctx.zero_fill(Some(150)), Some(vec![0]));
        assert_eq!(ctx.zero_fill(Some(100)), None);
        assert_eq!(ctx.zero_fill(None), None);

        let var = RunContext::new(config(FileType::Var)).unwrap();
        assert_eq!(var.zero_fill(Some(150)), None);
    }

    #[test]
    fn test_log_op_respects_logging_flag() {
        let quiet = RunContext::with_handler(config(FileType::Var), RecordingHandler::default());
        let mut quiet = quiet.unwrap();
        quiet.log_op(&OpRecord::new(OpKind::Read, Some(3)));
        assert!(quiet.handler().messages.is_empty());

        let mut loud_config = config(FileType::Var);
        loud_config.logging = true;
        let mut loud = RunContext::with_handler(loud_config, RecordingHandler::default()).unwrap();
        loud.log_op(&OpRecord::new(OpKind::Read, Some(3)));
        assert_eq!(loud.into_handler().messages, vec!["read      3"]);
    }
}
