use crate::domain::model::{ExtractResult, RunReport, TransformResult};
use crate::domain::schema::ColumnCandidates;
use crate::domain::template::TokenFormat;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Writes the whole file or nothing.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 供報告顯示的完整路徑
    fn display_path(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn sheet_name(&self) -> Option<&str>;
    fn template_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn column_candidates(&self) -> ColumnCandidates;
    fn token_format(&self) -> TokenFormat;
    fn file_prefix(&self) -> &str;
    /// 輸出副檔名；未設定時沿用模板副檔名
    fn output_extension(&self) -> Option<&str>;
    fn bundle_name(&self) -> Option<&str>;
    fn report_name(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Fails only on problems that make the whole run impossible.
    async fn preflight(&self) -> Result<()>;
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, data: ExtractResult) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunReport>;
}
