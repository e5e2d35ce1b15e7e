// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_buffer(lines: usize) -> String {
    let base = "fn example(value: usize) -> usize {\n    value * 2\n}\n\n";
    base.repeat(lines)
}

/// Same text with every `n`th line changed, to get scattered edits.
#[allow(dead_code)]
pub fn scatter_edits(text: &str, n: usize) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i % n == 0 {
                line.replace("value", "input")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A template with `count` tabstops, each followed by a mirror.
#[allow(dead_code)]
pub fn generate_template(count: usize) -> String {
    let mut template = String::new();
    for n in 1..=count {
        template.push_str(&format!("${{{n}:field{n}}} = ${n};\n"));
    }
    template
}
