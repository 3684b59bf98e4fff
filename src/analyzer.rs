use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysisRequest {
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileAnalysis {
    pub summary: String,
    pub lines: usize,
    pub words: usize,
    pub complexity: String,
    pub recommendations: String,
}

/// Heuristic analysis over uploaded text content: line/word counts, a linear
/// complexity score, and canned recommendations per file family.
pub fn analyze(request: &FileAnalysisRequest) -> FileAnalysis {
    let extension = file_extension(&request.file_name);

    if request.file_type.contains("text")
        || request.file_type.contains("json")
        || request.file_type.contains("javascript")
    {
        analyze_text(request, &extension)
    } else if is_code_file(&extension) {
        analyze_code(request, &extension)
    } else if extension == "csv" || extension == "xml" {
        analyze_data(request, &extension)
    } else {
        FileAnalysis {
            summary: format!(
                "ملف من نوع {} بحجم {}",
                request.file_type,
                format_file_size(request.file_size)
            ),
            lines: 0,
            words: 0,
            complexity: "غير محدد".to_string(),
            recommendations: "يمكن معالجة هذا النوع من الملفات حسب احتياجاتك الخاصة".to_string(),
        }
    }
}

fn file_extension(file_name: &str) -> String {
    file_name.rsplit('.').next().unwrap_or("").to_lowercase()
}

fn analyze_text(request: &FileAnalysisRequest, extension: &str) -> FileAnalysis {
    let lines = request.content.split('\n').count();
    let words = request.content.split_whitespace().count();
    let characters = request.content.chars().count();

    let complexity = if lines > 1000 {
        "معقد"
    } else if lines > 100 {
        "متوسط"
    } else {
        "بسيط"
    };

    FileAnalysis {
        summary: format!(
            "ملف نصي يحتوي على {} سطر و {} كلمة و {} حرف",
            lines, words, characters
        ),
        lines,
        words,
        complexity: complexity.to_string(),
        recommendations: text_recommendations(extension, lines),
    }
}

fn analyze_code(request: &FileAnalysisRequest, extension: &str) -> FileAnalysis {
    let lines = request.content.split('\n').count();
    let code_lines = request
        .content
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("//") && !trimmed.starts_with("/*")
        })
        .count();

    FileAnalysis {
        summary: format!(
            "ملف برمجي بلغة {} يحتوي على {} سطر كود فعلي من أصل {} سطر",
            language_name(extension),
            code_lines,
            lines
        ),
        lines: code_lines,
        words: request.content.split_whitespace().count(),
        complexity: code_complexity(&request.content).to_string(),
        recommendations: code_recommendations(extension, code_lines),
    }
}

fn analyze_data(request: &FileAnalysisRequest, extension: &str) -> FileAnalysis {
    FileAnalysis {
        summary: format!(
            "ملف بيانات بتنسيق {} بحجم {}",
            extension.to_uppercase(),
            format_file_size(request.file_size)
        ),
        lines: request.content.split('\n').count(),
        words: 0,
        complexity: data_complexity(&request.content, extension).to_string(),
        recommendations: data_recommendations(extension, request.file_size),
    }
}

fn is_code_file(extension: &str) -> bool {
    const CODE_EXTENSIONS: [&str; 20] = [
        "js", "ts", "jsx", "tsx", "py", "java", "cpp", "c", "cs", "php", "rb", "go", "rs",
        "swift", "kt", "dart", "html", "css", "scss", "sass",
    ];
    CODE_EXTENSIONS.contains(&extension)
}

fn language_name(extension: &str) -> &'static str {
    match extension {
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "jsx" => "React JSX",
        "tsx" => "React TypeScript",
        "py" => "Python",
        "java" => "Java",
        "cpp" => "C++",
        "c" => "C",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "dart" => "Dart",
        "html" => "HTML",
        "css" => "CSS",
        _ => "غير محدد",
    }
}

fn count_occurrences(content: &str, pattern: &str) -> usize {
    content.match_indices(pattern).count()
}

/// Linear score over declaration/loop/branch markers plus raw length.
fn code_complexity(content: &str) -> &'static str {
    let functions = count_occurrences(content, "function")
        + count_occurrences(content, "def")
        + count_occurrences(content, "class")
        + count_occurrences(content, "interface");
    let loops = count_occurrences(content, "for") + count_occurrences(content, "while");
    let conditions = count_occurrences(content, "if")
        + count_occurrences(content, "switch")
        + count_occurrences(content, "case");
    let lines = content.split('\n').count();

    let score = functions as f64 * 2.0
        + loops as f64 * 1.5
        + conditions as f64 * 1.0
        + lines as f64 * 0.1;

    if score > 100.0 {
        "معقد جداً"
    } else if score > 50.0 {
        "معقد"
    } else if score > 20.0 {
        "متوسط"
    } else {
        "بسيط"
    }
}

fn data_complexity(content: &str, extension: &str) -> &'static str {
    if extension == "json" {
        return match serde_json::from_str::<serde_json::Value>(content) {
            Ok(serde_json::Value::Object(map)) => {
                if map.len() > 50 {
                    "معقد"
                } else if map.len() > 10 {
                    "متوسط"
                } else {
                    "بسيط"
                }
            }
            Ok(serde_json::Value::Array(items)) => {
                if items.len() > 50 {
                    "معقد"
                } else if items.len() > 10 {
                    "متوسط"
                } else {
                    "بسيط"
                }
            }
            Ok(_) => "بسيط",
            Err(_) => "تنسيق غير صحيح",
        };
    }

    if extension == "csv" {
        let lines = content.split('\n').count();
        let columns = content.split('\n').next().map(|l| l.split(',').count()).unwrap_or(0);
        return if lines > 1000 || columns > 20 { "معقد" } else { "متوسط" };
    }

    "متوسط"
}

fn text_recommendations(extension: &str, lines: usize) -> String {
    let mut recommendations = Vec::new();

    if lines > 1000 {
        recommendations.push("• يُنصح بتقسيم الملف إلى أجزاء أصغر لسهولة القراءة");
    }

    if extension == "md" {
        recommendations.push("• ملف Markdown - يمكن تحويله إلى HTML أو PDF");
    }

    if extension == "txt" {
        recommendations.push("• يمكن تحويل الملف إلى تنسيقات أخرى حسب الحاجة");
    }

    if recommendations.is_empty() {
        "الملف في حالة جيدة".to_string()
    } else {
        recommendations.join("\n")
    }
}

fn code_recommendations(extension: &str, code_lines: usize) -> String {
    let mut recommendations = Vec::new();

    if code_lines > 500 {
        recommendations.push("• يُنصح بتقسيم الكود إلى ملفات أو وحدات أصغر");
    }

    if extension == "js" || extension == "ts" {
        recommendations.push("• تأكد من استخدام ESLint و Prettier لتحسين جودة الكود");
    }

    if extension == "py" {
        recommendations.push("• استخدم PEP 8 لتنسيق الكود Python");
    }

    recommendations.push("• قم بإضافة تعليقات وثائقية للدوال المهمة");

    recommendations.join("\n")
}

fn data_recommendations(extension: &str, file_size: u64) -> String {
    let mut recommendations = Vec::new();

    if file_size > 10 * 1024 * 1024 {
        recommendations.push("• الملف كبير - يُنصح بضغطه أو تقسيمه");
    }

    if extension == "json" {
        recommendations.push("• تأكد من صحة تنسيق JSON قبل الاستخدام");
    }

    if extension == "csv" {
        recommendations.push("• يمكن استيراد البيانات إلى Excel أو قاعدة بيانات");
    }

    if recommendations.is_empty() {
        "ملف البيانات جاهز للاستخدام".to_string()
    } else {
        recommendations.join("\n")
    }
}

/// Human-readable size, trimming trailing zeros ("1.5 KB", "1 KB").
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let formatted = format!("{:.2}", value);
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", formatted, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, file_type: &str, size: u64, content: &str) -> FileAnalysisRequest {
        FileAnalysisRequest {
            file_name: name.to_string(),
            file_type: file_type.to_string(),
            file_size: size,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_text_file_counts() {
        let analysis = analyze(&request("notes.txt", "text/plain", 24, "سطر أول\nسطر ثاني"));
        assert_eq!(analysis.lines, 2);
        assert_eq!(analysis.words, 4);
        assert_eq!(analysis.complexity, "بسيط");
        assert!(analysis.summary.contains("ملف نصي"));
        assert!(analysis.recommendations.contains("تنسيقات أخرى"));
    }

    #[test]
    fn test_large_text_file_is_complex() {
        let content = "line\n".repeat(1200);
        let analysis = analyze(&request("big.txt", "text/plain", 6000, &content));
        assert_eq!(analysis.complexity, "معقد");
        assert!(analysis.recommendations.contains("أجزاء أصغر"));
    }

    #[test]
    fn test_code_file_skips_comment_lines() {
        let content = "// comment\nfn main() {\n\n    let x = 1;\n}\n";
        let analysis = analyze(&request("main.rs", "application/octet-stream", 64, content));
        assert!(analysis.summary.contains("Rust"));
        // comment and blank lines excluded
        assert_eq!(analysis.lines, 3);
        assert_eq!(analysis.complexity, "بسيط");
        assert!(analysis.recommendations.contains("تعليقات وثائقية"));
    }

    #[test]
    fn test_code_complexity_thresholds() {
        assert_eq!(code_complexity("let x = 1;"), "بسيط");

        let medium = "if a { }\n".repeat(25);
        assert_eq!(code_complexity(&medium), "متوسط");

        let heavy = "function f() { if (x) { for (;;) {} } }\n".repeat(40);
        assert_eq!(code_complexity(&heavy), "معقد جداً");
    }

    #[test]
    fn test_python_recommendations() {
        let analysis = analyze(&request("tool.py", "application/octet-stream", 10, "print(1)"));
        assert!(analysis.recommendations.contains("PEP 8"));
    }

    #[test]
    fn test_json_data_complexity() {
        assert_eq!(data_complexity("{\"a\": 1, \"b\": 2}", "json"), "بسيط");
        assert_eq!(data_complexity("{not json", "json"), "تنسيق غير صحيح");

        let wide: Vec<String> = (0..12).map(|i| format!("\"k{}\": {}", i, i)).collect();
        let wide = format!("{{{}}}", wide.join(", "));
        assert_eq!(data_complexity(&wide, "json"), "متوسط");
    }

    #[test]
    fn test_csv_data_branch() {
        let analysis = analyze(&request("data.csv", "application/octet-stream", 2048, "a,b,c\n1,2,3"));
        assert_eq!(analysis.complexity, "متوسط");
        assert!(analysis.summary.contains("CSV"));
        assert!(analysis.recommendations.contains("Excel"));
    }

    #[test]
    fn test_unknown_file_type() {
        let analysis = analyze(&request("photo.png", "image/png", 4096, ""));
        assert_eq!(analysis.lines, 0);
        assert_eq!(analysis.complexity, "غير محدد");
        assert!(analysis.summary.contains("image/png"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
