use once_cell::sync::Lazy;
use regex::Regex;

/// ASS line-break marker used when joining multi-line cue text.
pub const LINE_BREAK: &str = "\\N";

/// Override tag prefixing the original-language line: smaller and dimmed
/// below the translated line.
pub const SECONDARY_STYLE: &str = "{\\fs40\\c&HCCCCCC&}";

// Timestamp boundary: HH:MM:SS.mmm --> HH:MM:SS.mmm with comma or dot
// millisecond separators; some sources emit a broken --!> arrow.
static TIME_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2}[.,]\d{3})\s*(?:-->|--!>)\s*(\d{2}:\d{2}:\d{2}[.,]\d{3})")
        .unwrap()
});

/// One timed cue. Timestamps are normalized to dot millisecond separators.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleBlock {
    pub index: usize,
    pub start_time: String,
    pub end_time: String,
    pub text_lines: Vec<String>,
}

/// Parse SRT (or VTT) content into blocks. A block opens at a timestamp
/// line, accumulates non-blank text lines (bare cue numbers and the WEBVTT
/// header are skipped), and closes at a blank line or the next timestamp.
/// A trailing unterminated block is kept if it collected any text.
pub fn parse_srt(content: &str) -> Vec<SubtitleBlock> {
    let mut blocks: Vec<SubtitleBlock> = Vec::new();
    let mut current: Option<SubtitleBlock> = None;
    let mut index = 1;

    for line in content.trim().lines().map(str::trim) {
        if line.is_empty() {
            if let Some(block) = current.take() {
                if !block.text_lines.is_empty() {
                    blocks.push(block);
                }
            }
            continue;
        }

        if let Some(caps) = TIME_LINE_RE.captures(line) {
            if let Some(block) = current.take() {
                if !block.text_lines.is_empty() {
                    blocks.push(block);
                }
            }
            current = Some(SubtitleBlock {
                index,
                start_time: caps[1].replace(',', "."),
                end_time: caps[2].replace(',', "."),
                text_lines: Vec::new(),
            });
            index += 1;
        } else if let Some(block) = current.as_mut() {
            if !line.chars().all(|c| c.is_ascii_digit()) && line != "WEBVTT" {
                block.text_lines.push(line.to_string());
            }
        }
    }

    if let Some(block) = current {
        if !block.text_lines.is_empty() {
            blocks.push(block);
        }
    }

    blocks
}

/// Convert `HH:MM:SS.mmm` to the ASS `H:MM:SS.cs` convention: hours
/// unpadded, centiseconds truncated from milliseconds.
pub fn format_ass_time(time_str: &str) -> String {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return time_str.to_string();
    }

    let hours = match parts[0].parse::<u32>() {
        Ok(h) => h,
        Err(_) => return time_str.to_string(),
    };

    let (seconds, millis) = parts[2].split_once('.').unwrap_or((parts[2], ""));
    let centis = if millis.len() >= 2 { &millis[..2] } else { "00" };

    format!("{}:{}:{}.{}", hours, parts[1], seconds, centis)
}

pub fn ass_header(title: &str) -> String {
    format!(
        "[Script Info]\n\
         Title: {title}\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         PlayResX: 1920\n\
         PlayResY: 1080\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,Arial,65,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,-1,0,0,0,100,100,0,0,1,2,2,2,10,10,20,1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n"
    )
}

/// Render blocks into a complete ASS document.
pub fn render_ass(blocks: &[SubtitleBlock]) -> String {
    let mut doc = ass_header("Translated Subtitles");
    for block in blocks {
        let start = format_ass_time(&block.start_time);
        let end = format_ass_time(&block.end_time);
        let text = block.text_lines.join(LINE_BREAK);
        doc.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            start, end, text
        ));
    }
    doc
}
