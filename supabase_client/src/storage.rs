//! Object storage calls.

use bytes::Bytes;

use crate::{
    Bearer, SupabaseClient,
    error::{ClientError, ResponseExt},
};

impl SupabaseClient {
    /// Upload `content` to `bucket` under `path`. Existing objects are never
    /// overwritten; the backend answers with a conflict instead.
    #[tracing::instrument(skip(self, content, bearer), fields(size = content.len()), err)]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: Bytes,
        content_type: &str,
        bearer: Bearer<'_>,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .post(self.endpoint(&format!("storage/v1/object/{bucket}/{path}")))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(content);

        self.authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;
        Ok(())
    }

    /// Url under which an object of a public bucket is served
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!("storage/v1/object/public/{bucket}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use crate::SupabaseClient;

    #[test]
    fn it_builds_public_urls() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(
            client.public_url("distrito_fotos", "user-1/photo.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/distrito_fotos/user-1/photo.jpg"
        );
    }
}
