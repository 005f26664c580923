//! Console reporter with colored output

use crate::experiment::{Comparison, Experiment, ExperimentStatus};
use crate::scorer::{AggregateStats, ScoreCalculator, ScoreReport};
use crate::{Grade, ScoredText};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show the component breakdown
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single scored text
    pub fn report(&self, result: &ScoredText) {
        println!();
        println!(
            "{}",
            format!("📊 Text Quality: {}", result.source).bold()
        );
        println!();
        self.print_score(result.metrics().overall);
        self.print_breakdown(&result.report);

        if self.verbose {
            self.print_components(&result.report);
        }

        self.print_recommendations(&result.report);
        println!();
    }

    /// Report multiple results with summary
    pub fn report_many(&self, results: &[ScoredText], stats: &AggregateStats) {
        for result in results {
            self.report(result);
            println!("{}", "─".repeat(60));
        }

        self.print_summary(stats);
    }

    /// Report in quiet mode (just score)
    pub fn report_quiet(&self, result: &ScoredText) {
        let metrics = result.metrics();
        println!(
            "{}: {:.2} ({})",
            result.source,
            metrics.overall,
            self.colorize_grade(&metrics.grade())
        );
    }

    /// Full view of one experiment and its responses
    pub fn report_experiment(&self, experiment: &Experiment) {
        println!();
        println!(
            "{}",
            format!("🧪 Experiment {}", experiment.id).bold()
        );
        println!(
            "   Status: {} | Created: {}",
            self.colorize_status(experiment.status),
            experiment.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("   Prompt: {}", experiment.prompt.italic());
        if let Some(ref error) = experiment.error {
            println!("   {} {}", "✗".red(), error.red());
        }
        println!();

        for response in experiment.responses() {
            let m = &response.metrics;
            let marker = if response.generation_error {
                " (generation failed)".red().to_string()
            } else {
                String::new()
            };
            println!(
                "   {}{}  {}",
                response.config.bold(),
                marker,
                format!(
                    "temperature {} | top_p {} | max_tokens {}",
                    response.params.temperature, response.params.top_p, response.params.max_tokens
                )
                .dimmed()
            );
            println!(
                "   Overall {:.2} ({})  coherence {} | readability {} | completeness {} | structure {}",
                m.overall,
                self.colorize_grade(&m.grade()),
                m.coherence,
                m.readability,
                m.completeness,
                m.structure
            );
            if self.verbose {
                for line in response.text.lines() {
                    println!("     {}", line.dimmed());
                }
            } else {
                println!("     {}", preview(&response.text, 100).dimmed());
            }
            println!();
        }

        if let Some(comparison) = experiment.comparison() {
            self.print_comparison(&comparison, experiment);
        }
    }

    /// One line per experiment, newest first
    pub fn report_experiment_list(&self, experiments: &[Experiment]) {
        if experiments.is_empty() {
            println!("No experiments yet. Run one with `textgauge experiment run --prompt ...`");
            return;
        }
        for e in experiments {
            let best = e
                .comparison()
                .map(|c| format!("best {} {:.2}", c.best_overall.id, c.best_overall.metrics.overall))
                .unwrap_or_default();
            println!(
                "{}  {:<9}  {}  {}  {}",
                e.id.bold(),
                self.colorize_status(e.status),
                e.created_at.format("%Y-%m-%d %H:%M"),
                preview(&e.prompt, 50),
                best.dimmed()
            );
        }
    }

    fn print_comparison(&self, comparison: &Comparison<'_>, experiment: &Experiment) {
        println!("   {}", "Comparison:".bold());
        println!(
            "   {} Best overall:   {} ({:.2})",
            "→".cyan(),
            comparison.best_overall.config,
            comparison.best_overall.metrics.overall
        );
        println!(
            "   {} Most readable:  {} ({})",
            "→".cyan(),
            comparison.most_readable.config,
            comparison.most_readable.metrics.readability
        );
        println!(
            "   {} Most coherent:  {} ({})",
            "→".cyan(),
            comparison.most_coherent.config,
            comparison.most_coherent.metrics.coherence
        );
        println!(
            "   Spread: {:.2} points",
            Comparison::overall_spread(experiment.responses())
        );
        println!();
    }

    fn print_score(&self, overall: f64) {
        let grade = Grade::from_overall(overall);
        let score_bar = self.create_score_bar(overall);

        println!(
            "   Score: {} {}",
            score_bar,
            self.colorize_grade(&grade).bold()
        );
        println!("   {}", ScoreCalculator::grade_description(grade).dimmed());
        println!();
    }

    fn print_breakdown(&self, report: &ScoreReport) {
        println!("   {}", "Score Breakdown:".bold());

        let m = &report.metrics;
        let categories = [
            ("Coherence", m.coherence),
            ("Readability", m.readability),
            ("Completeness", m.completeness),
            ("Structure", m.structure),
        ];
        for (name, score) in categories {
            let bar = create_mini_bar(score);
            let score_str = format!("{:>3}/100", score);
            let colored_score = if score >= 80 {
                score_str.green()
            } else if score >= 60 {
                score_str.yellow()
            } else {
                score_str.red()
            };
            println!("   {} {} {}", bar, colored_score, name);
        }
        println!();
    }

    fn print_components(&self, report: &ScoreReport) {
        println!("   {}", "Components:".bold());

        match report.coherence.components {
            Some(ref c) => println!(
                "   {} coherence: {} sentences, {} transitions | transition {:.1}, consistency {:.1}, repetition {:.1}",
                "↳".dimmed(),
                c.sentence_count,
                c.transition_count,
                c.transition,
                c.consistency,
                c.repetition
            ),
            None => println!("   {} coherence: fallback (too short)", "↳".dimmed()),
        }

        match report.readability.components {
            Some(ref c) => println!(
                "   {} readability: {:.1} words/sentence, {:.2} chars/word, {:.2} syllables/word | punctuation {:.0}",
                "↳".dimmed(),
                c.avg_sentence_length,
                c.avg_word_length,
                c.avg_syllables,
                c.punctuation
            ),
            None => println!("   {} readability: fallback (too short)", "↳".dimmed()),
        }

        match report.completeness.components {
            Some(ref c) => println!(
                "   {} completeness: {}/{} keywords, {} paragraphs, {} explanations, length ratio {:.2}",
                "↳".dimmed(),
                c.keywords_covered,
                c.keywords_total,
                c.paragraph_count,
                c.explanation_count,
                c.length_ratio
            ),
            None => println!("   {} completeness: fallback (too short)", "↳".dimmed()),
        }

        match report.structure.components {
            Some(ref c) => println!(
                "   {} structure: {} paragraphs, formatting {}, list {}, intro {}, conclusion {}",
                "↳".dimmed(),
                c.paragraph_count,
                yes_no(c.has_formatting),
                yes_no(c.has_list),
                yes_no(c.has_intro),
                yes_no(c.has_conclusion)
            ),
            None => println!("   {} structure: fallback (too short)", "↳".dimmed()),
        }
        println!();
    }

    fn print_recommendations(&self, report: &ScoreReport) {
        if report.metrics.overall >= 90.0 {
            return;
        }
        let recs = ScoreCalculator::recommendations(&report.metrics);
        println!("   {}", "Recommendations:".bold());
        for rec in recs.iter().take(3) {
            println!("   {} {}", "→".cyan(), rec);
        }
    }

    fn print_summary(&self, stats: &AggregateStats) {
        println!();
        println!("{}", "═".repeat(60));
        println!("{}", "Summary".bold());
        println!("{}", "═".repeat(60));
        println!("   Files scored:  {}", stats.files_scored.to_string().bold());
        println!(
            "   Average score: {} ({})",
            format!("{:.2}", stats.average_overall).bold(),
            self.colorize_grade(&stats.average_grade())
        );
        if let (Some(source), Some(score)) = (&stats.lowest_source, stats.lowest_overall) {
            println!("   Lowest:        {} ({:.2})", source, score);
        }
        println!();
    }

    fn colorize_grade(&self, grade: &Grade) -> colored::ColoredString {
        let s = grade.to_string();
        match grade {
            Grade::A => s.green().bold(),
            Grade::B => s.green(),
            Grade::C => s.yellow(),
            Grade::D => s.red(),
            Grade::F => s.red().bold(),
        }
    }

    fn colorize_status(&self, status: ExperimentStatus) -> colored::ColoredString {
        let s = status.to_string();
        match status {
            ExperimentStatus::Completed => s.green(),
            ExperimentStatus::Running => s.blue(),
            ExperimentStatus::Failed => s.red(),
            ExperimentStatus::Pending => s.yellow(),
        }
    }

    fn create_score_bar(&self, overall: f64) -> String {
        let bar = score_bar(overall);

        if self.use_colors {
            if overall >= 80.0 {
                bar.green().to_string()
            } else if overall >= 60.0 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `[████░░░░] 71.28` with 20 cells
fn score_bar(overall: f64) -> String {
    let clamped = overall.clamp(0.0, 100.0);
    let filled = (clamped / 5.0).floor() as usize;
    let empty = 20 - filled;
    format!(
        "[{}{}] {:>6.2}",
        "█".repeat(filled),
        "░".repeat(empty),
        clamped
    )
}

fn create_mini_bar(score: u8) -> String {
    let filled = (score.min(100) as usize) / 10;
    let empty = 10 - filled;
    format!("[{}{}]", "▓".repeat(filled), "░".repeat(empty))
}

/// First line of `text`, cut to `max` chars
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= max {
        line.to_string()
    } else {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
