use std::fs;
use std::io;
use std::path::PathBuf;

/// 文章输出
pub trait Outlet {
    fn save(&self, sections: &[String]) -> io::Result<PathBuf>;
}

/// 写入 markdown 文件：每个章节后追加一个空行分隔，UTF-8 编码
pub struct MarkdownOutlet {
    output_dir: PathBuf,
    file_name: String,
}

impl MarkdownOutlet {
    pub fn new(output_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

impl Outlet for MarkdownOutlet {
    fn save(&self, sections: &[String]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.output_path();
        fs::write(&output_path, render(sections))?;

        tracing::info!(path = %output_path.display(), "💾 已保存文章");
        Ok(output_path)
    }
}

/// 拼接章节文本，每个章节后跟 `\n\n`
pub fn render(sections: &[String]) -> String {
    let capacity = sections.iter().map(|s| s.len() + 2).sum();
    sections
        .iter()
        .fold(String::with_capacity(capacity), |mut acc, section| {
            acc.push_str(section);
            acc.push_str("\n\n");
            acc
        })
}
