use url::Url;

/// Hosts whose images may be fetched through `/api/proxy-image` or handed to
/// the upscaler. Subdomains of each entry are accepted.
const ALLOWED_IMAGE_DOMAINS: [&str; 7] = [
    "hf.space",
    "huggingface.co",
    "gitee.com",
    "giteeai.com",
    "modelscope.cn",
    "aliyuncs.com",
    "pollinations.ai",
];

pub fn is_allowed_image_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if url.scheme() != "https" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    ALLOWED_IMAGE_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_hosts_over_https() {
        for url in [
            "https://mrfakename-z-image-turbo.hf.space/gradio_api/file=/tmp/a.png",
            "https://huggingface.co/datasets/x/resolve/main/a.png",
            "https://cdn.gitee.com/a.png",
            "https://ai.giteeai.com/a.webp",
            "https://muse-ai.oss-cn-hangzhou.aliyuncs.com/img/a.jpeg",
            "https://modelscope.cn/a.png",
            "https://image.pollinations.ai/prompt/cat",
        ] {
            assert!(is_allowed_image_url(url), "{url}");
        }
    }

    #[test]
    fn rejects_other_schemes_and_lookalike_hosts() {
        for url in [
            "http://huggingface.co/a.png",
            "ftp://gitee.com/a.png",
            "https://evilhuggingface.co/a.png",
            "https://huggingface.co.evil.com/a.png",
            "https://localhost/a.png",
            "https://127.0.0.1/a.png",
            "not a url",
            "",
        ] {
            assert!(!is_allowed_image_url(url), "{url}");
        }
    }
}
