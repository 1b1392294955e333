//! Debug utilities for inspecting generated code

use super::instruction::Instruction;

/// Render instructions as assembly text, one per line.
///
/// With `source_map` set, a `// line N` comment is written whenever the
/// source line of the originating node changes.
pub fn format_listing(instructions: &[Instruction], source_map: bool) -> String {
    let mut out = String::new();
    let mut last_line = None;

    for instr in instructions {
        if source_map && last_line != Some(instr.origin.line) {
            out.push_str(&format!("// line {}\n", instr.origin.line));
            last_line = Some(instr.origin.line);
        }
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

/// Print instructions with their offsets and originating nodes
pub fn dump_code(instructions: &[Instruction]) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    CODE DUMP");
    println!("═══════════════════════════════════════════════════════════");
    for (i, instr) in instructions.iter().enumerate() {
        println!("{:04}: {:<40} ; node {}", i, instr.to_string(), instr.origin.node);
    }
    println!("═══════════════════════════════════════════════════════════\n");
}
