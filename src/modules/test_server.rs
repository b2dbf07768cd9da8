use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use super::credentials::ServiceAccountKey;

// throwaway 2048 bit key, only ever used against the local server
pub const TEST_PRIVATE_KEY: &str = include_str!("../../testdata/test-rsa-key.pem");

// local http server answering each connection with the next canned response
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<(u16, &'static str)>) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let mut socket = match listener.accept().await {
                    Ok((socket, _)) => socket,
                    Err(_) => return,
                };
                let request_line = read_request(&mut socket).await;
                seen.lock().unwrap().push(request_line);

                let reply = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        StubServer { base_url, requests }
    }

    // request lines received so far, e.g. "POST /token HTTP/1.1"
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn key(&self) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "uploader@shop-demo.iam.gserviceaccount.com".to_owned(),
            private_key: TEST_PRIVATE_KEY.to_owned(),
            token_uri: format!("{}/token", self.base_url),
            project_id: Some("shop-demo".to_owned()),
        }
    }
}

// the system proxy must not see requests to 127.0.0.1
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

// read one request (head and body), return its request line
async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap_or(0)))
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).lines().next().unwrap_or_default().to_owned()
}
